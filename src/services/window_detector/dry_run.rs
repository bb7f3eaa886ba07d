use crate::error::Result;
use crate::events::{EngineEvent, WindowId};
use crate::services::compositor::{Compositor, SimulatedCompositor};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::WindowDetectorTrait;

/// Эмулирует смену фокуса между окнами симулированного композитора
pub struct DryRunDetector {
    compositor: SimulatedCompositor,
    events: mpsc::Sender<EngineEvent>,
    period: Duration,
}

impl DryRunDetector {
    pub fn new(compositor: SimulatedCompositor, events: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            compositor,
            events,
            period: Duration::from_secs(10),
        }
    }

    /// Следующее окно-кандидат после текущего владельца фокуса
    fn next_focus(&mut self) -> Option<WindowId> {
        let candidates: Vec<WindowId> = self
            .compositor
            .windows()
            .ok()?
            .into_iter()
            .filter(|w| w.window_type.is_candidate())
            .map(|w| w.id)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let index = self
            .compositor
            .focused()
            .and_then(|current| candidates.iter().position(|id| *id == current))
            .map(|i| (i + 1) % candidates.len())
            .unwrap_or(0);
        Some(candidates[index])
    }

    async fn run_impl(mut self) -> Result<()> {
        info!("Dry-run режим - WindowDetector работает в режиме эмуляции");

        for id in self.compositor.window_ids() {
            if self.events.send(EngineEvent::WindowCreated(id)).await.is_err() {
                return Ok(());
            }
        }

        let mut ticker = interval(self.period);
        // Первый тик срабатывает сразу, пропускаем его
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(next) = self.next_focus() else {
                continue;
            };

            info!("Dry-run: эмулируем смену фокуса на окно {}", next);
            self.compositor.focus(Some(next));
            if self.events.send(EngineEvent::FocusChanged(next)).await.is_err() {
                info!("Движок остановлен, DryRunDetector завершает работу");
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl WindowDetectorTrait for DryRunDetector {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles_through_candidates_only() {
        let compositor = SimulatedCompositor::demo();
        let (tx, _rx) = mpsc::channel(8);
        let mut detector = DryRunDetector::new(compositor.clone(), tx);

        assert_eq!(detector.next_focus(), Some(WindowId(2)));
        compositor.focus(Some(WindowId(3)));
        // Окно 4 не кандидат, поэтому после 3 снова идёт 1
        assert_eq!(detector.next_focus(), Some(WindowId(1)));
    }

    #[tokio::test]
    async fn test_stops_when_engine_is_gone() {
        let compositor = SimulatedCompositor::demo();
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let detector: Box<dyn WindowDetectorTrait + Send> =
            Box::new(DryRunDetector::new(compositor, tx));
        assert!(detector.run().await.is_ok());
    }
}
