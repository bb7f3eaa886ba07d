use serde::{Deserialize, Serialize};

/// Внешние сигналы окружения, которыми движок не владеет
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientKey {
    NightLight,
    DarkStyle,
}

impl AmbientKey {
    pub const ALL: [AmbientKey; 2] = [AmbientKey::NightLight, AmbientKey::DarkStyle];
}

/// Текущее состояние ночного света и тёмной темы
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientState {
    pub night_light_active: bool,
    pub dark_style_active: bool,
}

impl AmbientState {
    pub fn new(night_light_active: bool, dark_style_active: bool) -> Self {
        Self {
            night_light_active,
            dark_style_active,
        }
    }

    /// Ключи, значения которых отличаются между двумя состояниями
    pub fn changed_keys(&self, other: &AmbientState) -> Vec<AmbientKey> {
        let mut keys = Vec::new();
        if self.night_light_active != other.night_light_active {
            keys.push(AmbientKey::NightLight);
        }
        if self.dark_style_active != other.dark_style_active {
            keys.push(AmbientKey::DarkStyle);
        }
        keys
    }
}
