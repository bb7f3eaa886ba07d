pub mod ambient;
pub mod keyboard;
pub mod window;

pub use ambient::{AmbientKey, AmbientState};
pub use keyboard::{KeyCode, KeyState, Modifiers};
pub use window::{MaximizeState, Monitor, MonitorId, Rect, WindowId, WindowSnapshot, WindowType};

use crate::config::Settings;

/// События, которые производители доставляют в цикл движка.
///
/// Движок обрабатывает их строго по одному, каждое до конца.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    WindowCreated(WindowId),
    FocusChanged(WindowId),
    /// Известные окна сменили рамку, максимизацию или монитор
    WindowsChanged(Vec<WindowId>),
    OverviewShown,
    OverviewHidden,
    SettingsReloaded(Box<Settings>),
    Ambient(AmbientState),
    ToggleShortcut,
}
