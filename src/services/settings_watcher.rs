use crate::config::{Config, Settings};
use crate::error::Result;
use crate::events::EngineEvent;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

/// Следит за файлом конфигурации и пересылает движку новую секцию `[dimming]`
pub struct SettingsWatcher {
    path: PathBuf,
    polling_interval: Duration,
    events: mpsc::Sender<EngineEvent>,
    modified: Option<SystemTime>,
    current: Settings,
}

impl SettingsWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        current: Settings,
        polling_interval: Duration,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let path = path.into();
        let modified = Self::mtime(&path);
        Self {
            path,
            polling_interval,
            events,
            modified,
            current,
        }
    }

    fn mtime(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    /// Перечитать файл, если он изменился; `Some` только для новых валидных настроек
    pub fn poll(&mut self) -> Option<Settings> {
        let modified = Self::mtime(&self.path);
        if modified == self.modified {
            return None;
        }
        self.modified = modified;

        match Config::load(&self.path) {
            Ok(config) if config.dimming != self.current => {
                self.current = config.dimming.clone();
                Some(config.dimming)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Новая конфигурация отклонена, остаются прежние настройки: {:#}", e);
                None
            }
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Отслеживание изменений {:?}", self.path);

        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(settings) = self.poll() else {
                continue;
            };

            info!("Конфигурация перечитана из {:?}", self.path);
            if self
                .events
                .send(EngineEvent::SettingsReloaded(Box::new(settings)))
                .await
                .is_err()
            {
                return Ok(());
            }
        }
    }
}
