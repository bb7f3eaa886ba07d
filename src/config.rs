use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub dimming: Settings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub polling_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sway,
    Simulated,
}

/// На каких мониторах затемнять окна
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMonitor {
    #[default]
    All,
    Primary,
    Secondary,
}

/// Пользовательские параметры затемнения (секция `[dimming]`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub brightness: f64,
    pub saturation: f64,
    pub brightness_night_light: f64,
    pub saturation_night_light: f64,
    pub brightness_night_light_override: bool,
    pub saturation_night_light_override: bool,
    pub brightness_dark_style: f64,
    pub saturation_dark_style: f64,
    pub brightness_dark_style_override: bool,
    pub saturation_dark_style_override: bool,
    pub dimming_enabled: bool,
    pub target_monitor: TargetMonitor,
    pub dim_always_on_top: bool,
    pub dim_maximized: bool,
    pub dim_tiled: bool,
    pub toggle_shortcut: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: 0.75,
            saturation: 1.0,
            brightness_night_light: 0.75,
            saturation_night_light: 1.0,
            brightness_night_light_override: false,
            saturation_night_light_override: false,
            brightness_dark_style: 0.75,
            saturation_dark_style: 1.0,
            brightness_dark_style_override: false,
            saturation_dark_style_override: false,
            dimming_enabled: true,
            target_monitor: TargetMonitor::All,
            dim_always_on_top: true,
            dim_maximized: true,
            dim_tiled: true,
            toggle_shortcut: None,
        }
    }
}

/// Закрытый набор ключей конфигурации, на изменения которых можно подписаться
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Brightness,
    Saturation,
    BrightnessNightLight,
    SaturationNightLight,
    BrightnessNightLightOverride,
    SaturationNightLightOverride,
    BrightnessDarkStyle,
    SaturationDarkStyle,
    BrightnessDarkStyleOverride,
    SaturationDarkStyleOverride,
    DimmingEnabled,
    TargetMonitor,
    DimAlwaysOnTop,
    DimMaximized,
    DimTiled,
    ToggleShortcut,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 16] = [
        ConfigKey::Brightness,
        ConfigKey::Saturation,
        ConfigKey::BrightnessNightLight,
        ConfigKey::SaturationNightLight,
        ConfigKey::BrightnessNightLightOverride,
        ConfigKey::SaturationNightLightOverride,
        ConfigKey::BrightnessDarkStyle,
        ConfigKey::SaturationDarkStyle,
        ConfigKey::BrightnessDarkStyleOverride,
        ConfigKey::SaturationDarkStyleOverride,
        ConfigKey::DimmingEnabled,
        ConfigKey::TargetMonitor,
        ConfigKey::DimAlwaysOnTop,
        ConfigKey::DimMaximized,
        ConfigKey::DimTiled,
        ConfigKey::ToggleShortcut,
    ];

    /// Ключи, от которых зависят параметры эффекта
    pub const EFFECT_PARAMETERS: [ConfigKey; 10] = [
        ConfigKey::Brightness,
        ConfigKey::Saturation,
        ConfigKey::BrightnessNightLight,
        ConfigKey::SaturationNightLight,
        ConfigKey::BrightnessNightLightOverride,
        ConfigKey::SaturationNightLightOverride,
        ConfigKey::BrightnessDarkStyle,
        ConfigKey::SaturationDarkStyle,
        ConfigKey::BrightnessDarkStyleOverride,
        ConfigKey::SaturationDarkStyleOverride,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::Brightness => "brightness",
            ConfigKey::Saturation => "saturation",
            ConfigKey::BrightnessNightLight => "brightness-night-light",
            ConfigKey::SaturationNightLight => "saturation-night-light",
            ConfigKey::BrightnessNightLightOverride => "brightness-night-light-override",
            ConfigKey::SaturationNightLightOverride => "saturation-night-light-override",
            ConfigKey::BrightnessDarkStyle => "brightness-dark-style",
            ConfigKey::SaturationDarkStyle => "saturation-dark-style",
            ConfigKey::BrightnessDarkStyleOverride => "brightness-dark-style-override",
            ConfigKey::SaturationDarkStyleOverride => "saturation-dark-style-override",
            ConfigKey::DimmingEnabled => "dimming-enabled",
            ConfigKey::TargetMonitor => "target-monitor",
            ConfigKey::DimAlwaysOnTop => "dim-always-on-top",
            ConfigKey::DimMaximized => "dim-maximized",
            ConfigKey::DimTiled => "dim-tiled",
            ConfigKey::ToggleShortcut => "toggle-shortcut",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Settings {
    /// Изменилось ли значение ключа между двумя наборами настроек
    fn differs(&self, other: &Settings, key: ConfigKey) -> bool {
        match key {
            ConfigKey::Brightness => self.brightness != other.brightness,
            ConfigKey::Saturation => self.saturation != other.saturation,
            ConfigKey::BrightnessNightLight => self.brightness_night_light != other.brightness_night_light,
            ConfigKey::SaturationNightLight => self.saturation_night_light != other.saturation_night_light,
            ConfigKey::BrightnessNightLightOverride => {
                self.brightness_night_light_override != other.brightness_night_light_override
            }
            ConfigKey::SaturationNightLightOverride => {
                self.saturation_night_light_override != other.saturation_night_light_override
            }
            ConfigKey::BrightnessDarkStyle => self.brightness_dark_style != other.brightness_dark_style,
            ConfigKey::SaturationDarkStyle => self.saturation_dark_style != other.saturation_dark_style,
            ConfigKey::BrightnessDarkStyleOverride => {
                self.brightness_dark_style_override != other.brightness_dark_style_override
            }
            ConfigKey::SaturationDarkStyleOverride => {
                self.saturation_dark_style_override != other.saturation_dark_style_override
            }
            ConfigKey::DimmingEnabled => self.dimming_enabled != other.dimming_enabled,
            ConfigKey::TargetMonitor => self.target_monitor != other.target_monitor,
            ConfigKey::DimAlwaysOnTop => self.dim_always_on_top != other.dim_always_on_top,
            ConfigKey::DimMaximized => self.dim_maximized != other.dim_maximized,
            ConfigKey::DimTiled => self.dim_tiled != other.dim_tiled,
            ConfigKey::ToggleShortcut => self.toggle_shortcut != other.toggle_shortcut,
        }
    }

    /// Ключи, значения которых отличаются от `other`
    pub fn changed_keys(&self, other: &Settings) -> Vec<ConfigKey> {
        ConfigKey::ALL
            .into_iter()
            .filter(|&key| self.differs(other, key))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let brightness = [
            ("brightness", self.brightness),
            ("brightness-night-light", self.brightness_night_light),
            ("brightness-dark-style", self.brightness_dark_style),
        ];
        for (name, value) in brightness {
            if !(0.1..=1.0).contains(&value) {
                anyhow::bail!("{} должно быть в диапазоне [0.1, 1.0], получено {}", name, value);
            }
        }

        let saturation = [
            ("saturation", self.saturation),
            ("saturation-night-light", self.saturation_night_light),
            ("saturation-dark-style", self.saturation_dark_style),
        ];
        for (name, value) in saturation {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} должно быть в диапазоне [0.0, 1.0], получено {}", name, value);
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            input: InputConfig {
                device_path: "auto".to_string(),
            },
            backend: BackendConfig {
                kind: BackendKind::Sway,
                polling_interval_ms: 250,
            },
            dimming: Settings::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DIM_").split("__").map(|key| env_key(key.as_str()).into()));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.backend.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        self.dimming.validate()
    }
}

// Ключи `[dimming]` в kebab-case, а переменные окружения приходят с подчёркиваниями
fn env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    match key.strip_prefix("dimming.") {
        Some(field) => format!("dimming.{}", field.replace('_', "-")),
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_brightness_out_of_range_rejected() {
        let mut config = Config::default();
        config.dimming.brightness = 0.05;
        assert!(config.validate().is_err());

        config.dimming.brightness = 0.4;
        config.dimming.saturation_dark_style = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_changed_keys() {
        let old = Settings::default();
        let mut new = old.clone();
        assert!(old.changed_keys(&new).is_empty());

        new.brightness = 0.5;
        new.dim_tiled = false;
        new.toggle_shortcut = Some("<Super>d".to_string());
        assert_eq!(
            old.changed_keys(&new),
            vec![ConfigKey::Brightness, ConfigKey::DimTiled, ConfigKey::ToggleShortcut]
        );
    }

    #[test]
    fn test_load_merges_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "dim.toml",
                r#"
                [backend]
                kind = "simulated"
                polling_interval_ms = 500

                [dimming]
                saturation = 0.3
                target-monitor = "secondary"
                dim-maximized = false
                toggle-shortcut = "<Super>d"
                "#,
            )?;
            jail.set_env("DIM_DIMMING__BRIGHTNESS", "0.5");

            let config = Config::load("dim.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.backend.kind, BackendKind::Simulated);
            assert_eq!(config.backend.polling_interval_ms, 500);
            assert_eq!(config.logging.level, "info");
            assert_eq!(config.dimming.brightness, 0.5);
            assert_eq!(config.dimming.saturation, 0.3);
            assert_eq!(config.dimming.target_monitor, TargetMonitor::Secondary);
            assert!(!config.dimming.dim_maximized);
            assert!(config.dimming.dim_tiled);
            assert_eq!(config.dimming.toggle_shortcut.as_deref(), Some("<Super>d"));
            Ok(())
        });
    }

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(env_key("dimming.target_monitor"), "dimming.target-monitor");
        assert_eq!(env_key("DIMMING.DIM_TILED"), "dimming.dim-tiled");
        assert_eq!(env_key("backend.polling_interval_ms"), "backend.polling_interval_ms");
    }

    #[test]
    fn test_env_overrides_multi_word_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("dim.toml", "[dimming]\ndim-tiled = true\n")?;
            jail.set_env("DIM_DIMMING__TARGET_MONITOR", "primary");
            jail.set_env("DIM_DIMMING__DIM_TILED", "false");
            jail.set_env("DIM_DIMMING__BRIGHTNESS_NIGHT_LIGHT_OVERRIDE", "true");
            jail.set_env("DIM_BACKEND__POLLING_INTERVAL_MS", "300");

            let config = Config::load("dim.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.dimming.target_monitor, TargetMonitor::Primary);
            assert!(!config.dimming.dim_tiled);
            assert!(config.dimming.brightness_night_light_override);
            assert_eq!(config.backend.polling_interval_ms, 300);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("dim.toml", "[dimming]\nbrightness = 3.0\n")?;
            assert!(Config::load("dim.toml").is_err());
            Ok(())
        });
    }
}
