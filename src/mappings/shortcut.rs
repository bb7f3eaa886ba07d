//! Parsing of the `toggle-shortcut` accelerator.
//!
//! Two spellings are accepted: GTK style (`<Super><Shift>d`) and plus style
//! (`super+shift+d`). Exactly one non-modifier key is required.

use crate::events::{KeyCode, Modifiers};
use crate::mappings::KeyNameToEvdevCode;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("пустая комбинация")]
    Empty,

    #[error("неизвестный модификатор '{0}'")]
    UnknownModifier(String),

    #[error("неизвестная клавиша '{0}'")]
    UnknownKey(String),

    #[error("комбинация не содержит основной клавиши")]
    MissingKey,

    #[error("незакрытая скобка в '{0}'")]
    Unbalanced(String),
}

/// Разобранная комбинация клавиш
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: KeyCode,
    pub key_name: String,
}

impl Shortcut {
    pub fn parse(text: &str) -> Result<Self, ShortcutError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut modifiers = Modifiers::new();
        let key_name = if text.starts_with('<') {
            Self::parse_gtk(text, &mut modifiers)?
        } else {
            Self::parse_plus(text, &mut modifiers)?
        };

        if key_name.is_empty() {
            return Err(ShortcutError::MissingKey);
        }

        let code = KeyNameToEvdevCode::translate(key_name)
            .ok_or_else(|| ShortcutError::UnknownKey(key_name.to_string()))?;

        Ok(Self {
            modifiers,
            key: KeyCode(code),
            key_name: key_name.to_lowercase(),
        })
    }

    fn parse_gtk<'a>(text: &'a str, modifiers: &mut Modifiers) -> Result<&'a str, ShortcutError> {
        let mut rest = text;
        while let Some(tail) = rest.strip_prefix('<') {
            let end = tail
                .find('>')
                .ok_or_else(|| ShortcutError::Unbalanced(text.to_string()))?;
            let name = &tail[..end];
            if !modifiers.set_by_name(name) {
                return Err(ShortcutError::UnknownModifier(name.to_string()));
            }
            rest = &tail[end + 1..];
        }
        Ok(rest.trim())
    }

    fn parse_plus<'a>(text: &'a str, modifiers: &mut Modifiers) -> Result<&'a str, ShortcutError> {
        let mut parts: Vec<&str> = text.split('+').map(str::trim).collect();
        let key = parts.pop().unwrap_or_default();
        for name in parts {
            if !modifiers.set_by_name(name) {
                return Err(ShortcutError::UnknownModifier(name.to_string()));
            }
        }
        Ok(key)
    }

    /// Совпадает ли нажатие с этой комбинацией
    pub fn matches(&self, key: KeyCode, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_name)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key_name)
        }
    }
}

/// Состояние горячей клавиши для поверхности настроек
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShortcutStatus {
    #[default]
    Unset,
    Valid(Shortcut),
    Invalid { text: String, reason: ShortcutError },
}

impl ShortcutStatus {
    /// Комбинация задана, но не разобралась
    pub fn is_invalid(&self) -> bool {
        matches!(self, ShortcutStatus::Invalid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_invalid_only_for_unparsed_text() {
        assert!(!ShortcutStatus::Unset.is_invalid());
        assert!(!ShortcutStatus::Valid(Shortcut::parse("<Super>d").unwrap()).is_invalid());

        let reason = Shortcut::parse("<Hyper>d").unwrap_err();
        let status = ShortcutStatus::Invalid { text: "<Hyper>d".to_string(), reason };
        assert!(status.is_invalid());
    }

    #[test]
    fn test_parse_gtk_accelerator() {
        let shortcut = Shortcut::parse("<Super><Shift>d").unwrap();
        assert_eq!(shortcut.modifiers, Modifiers::new().with_super(true).with_shift(true));
        assert_eq!(shortcut.key, KeyCode(32));
        assert_eq!(shortcut.to_string(), "shift+super+d");
    }

    #[test]
    fn test_parse_plus_accelerator() {
        let shortcut = Shortcut::parse("Ctrl + Alt + F5").unwrap();
        assert_eq!(shortcut.modifiers, Modifiers::new().with_ctrl(true).with_alt(true));
        assert_eq!(shortcut.key, KeyCode(63));
        assert_eq!(shortcut.key_name, "f5");
    }

    #[test]
    fn test_bare_key_is_allowed() {
        let shortcut = Shortcut::parse("F9").unwrap();
        assert!(shortcut.modifiers.is_empty());
        assert_eq!(shortcut.to_string(), "f9");
    }

    #[test]
    fn test_invalid_accelerators() {
        assert_eq!(Shortcut::parse("   "), Err(ShortcutError::Empty));
        assert_eq!(Shortcut::parse("<Super>"), Err(ShortcutError::MissingKey));
        assert_eq!(Shortcut::parse("super+"), Err(ShortcutError::MissingKey));
        assert_eq!(
            Shortcut::parse("<Hyper>d"),
            Err(ShortcutError::UnknownModifier("Hyper".to_string()))
        );
        assert_eq!(
            Shortcut::parse("super+banana"),
            Err(ShortcutError::UnknownKey("banana".to_string()))
        );
        assert!(matches!(Shortcut::parse("<Super d"), Err(ShortcutError::Unbalanced(_))));
    }

    #[test]
    fn test_matches_requires_exact_modifiers() {
        let shortcut = Shortcut::parse("<Super>d").unwrap();
        let super_only = Modifiers::new().with_super(true);

        assert!(shortcut.matches(KeyCode(32), super_only));
        assert!(!shortcut.matches(KeyCode(32), super_only.with_shift(true)));
        assert!(!shortcut.matches(KeyCode(33), super_only));
    }
}
