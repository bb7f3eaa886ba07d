//! WindowDetector service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for noticing window
//! lifecycle changes (new windows, focus moves) and emitting `EngineEvent`s.
//! They MUST NOT decide anything about dimming. All dimming decisions are
//! made by the engine on its own reconciliation pass.

mod dry_run;
mod window_detector;
mod r#trait;

pub use self::r#trait::{create_window_detector, WindowDetectorTrait};
pub use self::window_detector::WindowChanges;
