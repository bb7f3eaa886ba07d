use crate::error::Result;
use crate::events::EngineEvent;
use crate::services::compositor::SimulatedCompositor;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Trait for window detectors that can run in different modes
#[async_trait::async_trait]
pub trait WindowDetectorTrait {
    /// Run the window detector until the engine stops listening
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory: a dry-run detector drives the simulated compositor, otherwise
/// the sway tree is polled.
pub fn create_window_detector(
    polling_interval: Duration,
    events: mpsc::Sender<EngineEvent>,
    simulated: Option<SimulatedCompositor>,
) -> Box<dyn WindowDetectorTrait + Send> {
    match simulated {
        Some(compositor) => Box::new(super::dry_run::DryRunDetector::new(compositor, events)),
        None => Box::new(super::window_detector::RealWindowDetector::new(polling_interval, events)),
    }
}
