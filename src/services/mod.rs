pub mod ambient;
pub mod compositor;
pub mod settings_watcher;
pub mod shortcut_listener;
pub mod window_detector;

pub use ambient::{AmbientSource, AmbientWatcher, DbusAmbientSource, StaticAmbientSource};
pub use compositor::{Compositor, SimulatedCompositor, SwayCompositor};
pub use settings_watcher::SettingsWatcher;
pub use shortcut_listener::{create_shortcut_listener, new_shortcut_watch, ShortcutWatch};
pub use window_detector::create_window_detector;
