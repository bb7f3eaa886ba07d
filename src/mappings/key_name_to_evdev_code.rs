/// Преобразование имён клавиш в evdev коды
/// Используется только для последней (не модификаторной) клавиши акселератора
pub struct KeyNameToEvdevCode;

impl KeyNameToEvdevCode {
    /// Получить evdev код клавиши по её имени (регистр не важен)
    pub fn translate(key_name: &str) -> Option<u16> {
        let normalized = key_name.to_lowercase();
        let code = match normalized.as_str() {
            // Буквенные клавиши, верхний ряд
            "q" => 16, "w" => 17, "e" => 18, "r" => 19, "t" => 20,
            "y" => 21, "u" => 22, "i" => 23, "o" => 24, "p" => 25,
            // Средний ряд
            "a" => 30, "s" => 31, "d" => 32, "f" => 33, "g" => 34,
            "h" => 35, "j" => 36, "k" => 37, "l" => 38,
            // Нижний ряд
            "z" => 44, "x" => 45, "c" => 46, "v" => 47, "b" => 48,
            "n" => 49, "m" => 50,

            // Цифровые клавиши (верхний ряд)
            "1" => 2, "2" => 3, "3" => 4, "4" => 5, "5" => 6,
            "6" => 7, "7" => 8, "8" => 9, "9" => 10, "0" => 11,

            // Функциональные клавиши
            "f1" => 59, "f2" => 60, "f3" => 61, "f4" => 62, "f5" => 63,
            "f6" => 64, "f7" => 65, "f8" => 66, "f9" => 67, "f10" => 68,
            "f11" => 87, "f12" => 88,

            // Специальные клавиши (GTK и короткие имена)
            "space" => 57,
            "enter" | "return" => 28,
            "escape" | "esc" => 1,
            "tab" => 15,
            "backspace" => 14,
            "insert" => 110,
            "delete" => 111,
            "home" => 102,
            "end" => 107,
            "pageup" | "page_up" | "prior" => 104,
            "pagedown" | "page_down" | "next" => 109,

            // Стрелки
            "up" => 103,
            "down" => 108,
            "left" => 105,
            "right" => 106,

            // Пунктуация
            "minus" => 12,
            "equal" => 13,
            "bracketleft" | "leftbrace" => 26,
            "bracketright" | "rightbrace" => 27,
            "semicolon" => 39,
            "apostrophe" => 40,
            "grave" => 41,
            "backslash" => 43,
            "comma" => 51,
            "period" | "dot" => 52,
            "slash" => 53,

            _ => return None,
        };
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_key_mapping() {
        assert_eq!(KeyNameToEvdevCode::translate("d"), Some(32));
        assert_eq!(KeyNameToEvdevCode::translate("space"), Some(57));
        assert_eq!(KeyNameToEvdevCode::translate("F12"), Some(88));
    }

    #[test]
    fn test_gtk_aliases() {
        assert_eq!(KeyNameToEvdevCode::translate("Return"), KeyNameToEvdevCode::translate("enter"));
        assert_eq!(KeyNameToEvdevCode::translate("Page_Up"), Some(104));
    }

    #[test]
    fn test_invalid_key() {
        assert_eq!(KeyNameToEvdevCode::translate("ctrl"), None);
        assert_eq!(KeyNameToEvdevCode::translate("invalid_key"), None);
    }
}
