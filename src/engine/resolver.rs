use crate::config::Settings;
use crate::events::AmbientState;

/// Смещение, которое не даёт рендереру выбросить граничное значение 1.0
pub const UNIFORM_EPSILON: f64 = 1e-6;

/// Параметры эффекта затемнения
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub brightness: f64,
    pub saturation: f64,
}

/// Параметр эффекта, который можно обновить на живом эффекте
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectParam {
    Brightness,
    Saturation,
}

impl EffectParam {
    pub fn uniform_name(self) -> &'static str {
        match self {
            EffectParam::Brightness => "brightness",
            EffectParam::Saturation => "saturation",
        }
    }
}

impl EffectParams {
    pub fn get(&self, param: EffectParam) -> f64 {
        match param {
            EffectParam::Brightness => self.brightness,
            EffectParam::Saturation => self.saturation,
        }
    }

    /// Значения в том виде, в котором они уходят в шейдер
    pub fn to_uniforms(self) -> EffectParams {
        EffectParams {
            brightness: uniform_value(self.brightness),
            saturation: uniform_value(self.saturation),
        }
    }
}

pub fn uniform_value(value: f64) -> f64 {
    value - UNIFORM_EPSILON
}

/// Выбор значения одного параметра: ночной свет важнее тёмной темы
fn pick(
    ambient: &AmbientState,
    base: f64,
    night_light: (bool, f64),
    dark_style: (bool, f64),
) -> f64 {
    let (night_light_override, night_light_value) = night_light;
    let (dark_style_override, dark_style_value) = dark_style;

    if ambient.night_light_active && night_light_override {
        night_light_value
    } else if ambient.dark_style_active && dark_style_override {
        dark_style_value
    } else {
        base
    }
}

pub fn resolve(settings: &Settings, ambient: &AmbientState) -> EffectParams {
    EffectParams {
        brightness: pick(
            ambient,
            settings.brightness,
            (settings.brightness_night_light_override, settings.brightness_night_light),
            (settings.brightness_dark_style_override, settings.brightness_dark_style),
        ),
        saturation: pick(
            ambient,
            settings.saturation,
            (settings.saturation_night_light_override, settings.saturation_night_light),
            (settings.saturation_dark_style_override, settings.saturation_dark_style),
        ),
    }
}
