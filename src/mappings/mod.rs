pub mod key_name_to_evdev_code;
pub mod shortcut;

pub use key_name_to_evdev_code::KeyNameToEvdevCode;
pub use shortcut::{Shortcut, ShortcutError, ShortcutStatus};
