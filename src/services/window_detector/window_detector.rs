use crate::error::Result;
use crate::events::{EngineEvent, MaximizeState, MonitorId, Rect, WindowId, WindowSnapshot};
use crate::services::compositor::SwayTree;
use crate::debug_if_enabled;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use super::r#trait::WindowDetectorTrait;

/// Сколько подряд неудачных опросов допускается до предупреждения
const FAILURES_BEFORE_WARN: u32 = 3;

/// То, от чего зависит решение о затемнении, кроме фокуса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    frame: Rect,
    maximize: MaximizeState,
    monitor: MonitorId,
    is_above: bool,
}

impl From<&WindowSnapshot> for Placement {
    fn from(window: &WindowSnapshot) -> Self {
        Self {
            frame: window.frame,
            maximize: window.maximize,
            monitor: window.monitor,
            is_above: window.is_above,
        }
    }
}

/// Разница между двумя опросами дерева окон
#[derive(Debug, Default)]
pub struct WindowChanges {
    known: HashMap<WindowId, Placement>,
    focused: Option<WindowId>,
}

impl WindowChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сравнить новый снимок с предыдущим и вернуть события для движка
    pub fn diff(&mut self, windows: &[WindowSnapshot]) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let mut moved = Vec::new();

        let current: HashMap<WindowId, Placement> =
            windows.iter().map(|w| (w.id, Placement::from(w))).collect();
        for window in windows {
            match self.known.get(&window.id) {
                None => events.push(EngineEvent::WindowCreated(window.id)),
                Some(previous) if *previous != current[&window.id] => moved.push(window.id),
                Some(_) => {}
            }
        }
        if !moved.is_empty() {
            debug_if_enabled!("Изменилось положение окон: {:?}", moved);
            events.push(EngineEvent::WindowsChanged(moved));
        }

        let focused = windows.iter().find(|w| w.has_focus).map(|w| w.id);
        if focused != self.focused {
            // Фокус ушёл в никуда: сообщаем о бывшем владельце фокуса
            match (focused, self.focused) {
                (Some(id), _) => events.push(EngineEvent::FocusChanged(id)),
                (None, Some(previous)) if current.contains_key(&previous) => {
                    events.push(EngineEvent::FocusChanged(previous))
                }
                _ => {}
            }
        }

        self.known = current;
        self.focused = focused;
        events
    }
}

pub struct RealWindowDetector {
    polling_interval: Duration,
    events: mpsc::Sender<EngineEvent>,
    changes: WindowChanges,
}

impl RealWindowDetector {
    pub fn new(polling_interval: Duration, events: mpsc::Sender<EngineEvent>) -> Self {
        info!("Инициализация RealWindowDetector (интервал {:?})", polling_interval);
        Self {
            polling_interval,
            events,
            changes: WindowChanges::new(),
        }
    }

    async fn run_impl(mut self) -> Result<()> {
        info!("RealWindowDetector запущен, опрашиваем дерево sway");

        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut failures = 0u32;

        loop {
            ticker.tick().await;

            let tree = match tokio::task::spawn_blocking(SwayTree::fetch).await {
                Ok(Ok(tree)) => tree,
                Ok(Err(e)) => {
                    failures += 1;
                    if failures == FAILURES_BEFORE_WARN {
                        warn!("Не удалось получить дерево окон {} раз подряд: {}", failures, e);
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Задача опроса sway аварийно завершилась: {}", e);
                    continue;
                }
            };
            failures = 0;

            for event in self.changes.diff(&tree.windows) {
                debug_if_enabled!("WindowDetector: {:?}", event);
                if self.events.send(event).await.is_err() {
                    info!("Движок остановлен, RealWindowDetector завершает работу");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl WindowDetectorTrait for RealWindowDetector {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: u64, focused: bool) -> WindowSnapshot {
        WindowSnapshot::new(WindowId(id), format!("w{}", id)).with_focus(focused)
    }

    #[test]
    fn test_first_poll_reports_all_windows_and_focus() {
        let mut changes = WindowChanges::new();
        let events = changes.diff(&[window(1, true), window(2, false)]);

        assert_eq!(
            events,
            vec![
                EngineEvent::WindowCreated(WindowId(1)),
                EngineEvent::WindowCreated(WindowId(2)),
                EngineEvent::FocusChanged(WindowId(1)),
            ]
        );
    }

    #[test]
    fn test_unchanged_poll_is_silent() {
        let mut changes = WindowChanges::new();
        changes.diff(&[window(1, true), window(2, false)]);
        assert!(changes.diff(&[window(1, true), window(2, false)]).is_empty());
    }

    #[test]
    fn test_focus_move_and_new_window() {
        let mut changes = WindowChanges::new();
        changes.diff(&[window(1, true)]);

        let events = changes.diff(&[window(1, false), window(3, true)]);
        assert_eq!(
            events,
            vec![
                EngineEvent::WindowCreated(WindowId(3)),
                EngineEvent::FocusChanged(WindowId(3)),
            ]
        );
    }

    #[test]
    fn test_layout_change_of_known_window() {
        let mut changes = WindowChanges::new();
        changes.diff(&[window(1, true), window(2, false), window(3, false)]);

        let maximized = window(2, false).with_maximize(MaximizeState::Both);
        let moved = window(3, false).on_monitor(MonitorId(1));
        let events = changes.diff(&[window(1, true), maximized, moved]);
        assert_eq!(events, vec![EngineEvent::WindowsChanged(vec![WindowId(2), WindowId(3)])]);

        // Новое окно не считается изменившимся
        let events = changes.diff(&[window(1, true), window(4, false)]);
        assert_eq!(events, vec![EngineEvent::WindowCreated(WindowId(4))]);
    }

    #[test]
    fn test_focus_lost_reports_previous_owner() {
        let mut changes = WindowChanges::new();
        changes.diff(&[window(1, true), window(2, false)]);

        let events = changes.diff(&[window(1, false), window(2, false)]);
        assert_eq!(events, vec![EngineEvent::FocusChanged(WindowId(1))]);
    }
}
