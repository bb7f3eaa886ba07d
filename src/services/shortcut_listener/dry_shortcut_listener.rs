use crate::error::Result;
use crate::events::EngineEvent;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use super::r#trait::ShortcutListenerTrait;
use super::ShortcutWatch;

/// Без доступа к устройствам: изредка «нажимает» зарегистрированную комбинацию
pub struct DryRunShortcutListener {
    watch: ShortcutWatch,
    events: mpsc::Sender<EngineEvent>,
    period: Duration,
}

impl DryRunShortcutListener {
    pub fn new(watch: ShortcutWatch, events: mpsc::Sender<EngineEvent>) -> Self {
        info!("Инициализация DryRunShortcutListener");
        Self {
            watch,
            events,
            period: Duration::from_secs(30),
        }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - ShortcutListener работает в режиме эмуляции");

        let mut ticker = interval(self.period);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let shortcut = self.watch.read().clone();
            let Some(shortcut) = shortcut else {
                debug!("ShortcutListener работает в dry-run режиме, комбинация не задана");
                continue;
            };

            info!("Dry-run: эмулируем нажатие {}", shortcut);
            if self.events.send(EngineEvent::ToggleShortcut).await.is_err() {
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl ShortcutListenerTrait for DryRunShortcutListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
