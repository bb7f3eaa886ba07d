use crate::error::Result;
use crate::events::EngineEvent;
use tokio::sync::mpsc;

use super::ShortcutWatch;

/// Trait for shortcut listeners that can run in different modes
#[async_trait::async_trait]
pub trait ShortcutListenerTrait {
    /// Run the listener until the engine stops listening
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate shortcut listener based on the dry_run flag
pub fn create_shortcut_listener(
    device_path: &str,
    watch: ShortcutWatch,
    events: mpsc::Sender<EngineEvent>,
    dry_run: bool,
) -> Result<Box<dyn ShortcutListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_shortcut_listener::DryRunShortcutListener::new(watch, events)))
    } else {
        Ok(Box::new(super::shortcut_listener::RealShortcutListener::new(
            device_path,
            watch,
            events,
        )?))
    }
}
