mod dry_shortcut_listener;
mod key_mapping;
mod modifier_state;
mod shortcut_listener;
mod r#trait;

pub use self::key_mapping::KeyMapper;
pub use self::modifier_state::ModifierState;
pub use self::r#trait::{create_shortcut_listener, ShortcutListenerTrait};
pub use self::shortcut_listener::ChordDetector;

use crate::mappings::Shortcut;
use parking_lot::RwLock;
use std::sync::Arc;

/// Комбинация, которую сейчас слушает клавиатурный поток.
///
/// Пишет её компоновщик при регистрации, читает слушатель на каждом нажатии.
pub type ShortcutWatch = Arc<RwLock<Option<Shortcut>>>;

pub fn new_shortcut_watch() -> ShortcutWatch {
    Arc::new(RwLock::new(None))
}
