use crate::mappings::KeyNameToEvdevCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Канонические имена клавиш для логов; псевдонимы сюда не входят
const CANONICAL_NAMES: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
    "space", "enter", "escape", "tab", "backspace", "insert", "delete",
    "home", "end", "pageup", "pagedown", "up", "down", "left", "right",
    "minus", "equal", "bracketleft", "bracketright", "semicolon", "apostrophe",
    "grave", "backslash", "comma", "period", "slash",
];

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    CANONICAL_NAMES
        .iter()
        .filter_map(|name| KeyNameToEvdevCode::translate(name).map(|code| (code, *name)))
        .collect()
});

/// Обратное преобразование evdev кода в имя клавиши
pub struct KeyMapper;

impl KeyMapper {
    pub fn get_key_name(key_code: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&key_code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_mapping() {
        assert_eq!(KeyMapper::get_key_name(32), Some("d"));
        assert_eq!(KeyMapper::get_key_name(28), Some("enter"));
        assert_eq!(KeyMapper::get_key_name(88), Some("f12"));
        assert_eq!(KeyMapper::get_key_name(29), None);
    }

    #[test]
    fn test_every_canonical_name_is_known() {
        assert_eq!(CODE_TO_NAME.len(), CANONICAL_NAMES.len());
    }
}
