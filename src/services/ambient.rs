//! Night light and dark appearance signals.

use crate::dim_error;
use crate::error::Result;
use crate::events::{AmbientState, EngineEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};
use zbus::zvariant::{OwnedValue, Value};
use zbus::Connection;

const COLOR_SERVICE: &str = "org.gnome.SettingsDaemon.Color";
const COLOR_PATH: &str = "/org/gnome/SettingsDaemon/Color";

const PORTAL_SERVICE: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const PORTAL_SETTINGS: &str = "org.freedesktop.portal.Settings";

/// Значение `color-scheme`, которое означает тёмную тему
const PREFER_DARK: u32 = 1;

#[async_trait::async_trait]
pub trait AmbientSource: Send {
    /// Текущее состояние; недоступный сервис читается как «выключено»
    async fn read(&mut self) -> AmbientState;
}

pub struct DbusAmbientSource {
    connection: Connection,
}

impl DbusAmbientSource {
    pub async fn connect() -> Result<Self> {
        let connection = Connection::session()
            .await
            .map_err(|e| dim_error!(service_unavailable, "сессионная шина D-Bus: {}", e))?;
        info!("Подключение к D-Bus для внешних сигналов установлено");
        Ok(Self { connection })
    }

    async fn night_light(&self) -> Result<bool> {
        let reply = self
            .connection
            .call_method(
                Some(COLOR_SERVICE),
                COLOR_PATH,
                Some("org.freedesktop.DBus.Properties"),
                "Get",
                &(COLOR_SERVICE, "NightLightActive"),
            )
            .await?;
        let value: OwnedValue = reply.body().deserialize()?;
        Ok(as_bool(&value).unwrap_or(false))
    }

    async fn dark_style(&self) -> Result<bool> {
        let reply = self
            .connection
            .call_method(
                Some(PORTAL_SERVICE),
                PORTAL_PATH,
                Some(PORTAL_SETTINGS),
                "ReadOne",
                &("org.freedesktop.appearance", "color-scheme"),
            )
            .await?;
        let value: OwnedValue = reply.body().deserialize()?;
        Ok(as_u32(&value) == Some(PREFER_DARK))
    }
}

#[async_trait::async_trait]
impl AmbientSource for DbusAmbientSource {
    async fn read(&mut self) -> AmbientState {
        let night_light = self.night_light().await.unwrap_or_else(|e| {
            debug!("Ночной свет недоступен: {}", e);
            false
        });
        let dark_style = self.dark_style().await.unwrap_or_else(|e| {
            debug!("Настройки оформления недоступны: {}", e);
            false
        });
        AmbientState::new(night_light, dark_style)
    }
}

// Порталы старых версий заворачивают значение в ещё один вариант
fn as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Value(inner) => as_bool(inner),
        _ => None,
    }
}

fn as_u32(value: &Value<'_>) -> Option<u32> {
    match value {
        Value::U32(v) => Some(*v),
        Value::Value(inner) => as_u32(inner),
        _ => None,
    }
}

/// Фиксированные сигналы для сухого запуска и тестов
#[derive(Debug, Clone, Default)]
pub struct StaticAmbientSource {
    state: Arc<RwLock<AmbientState>>,
}

impl StaticAmbientSource {
    pub fn new(state: AmbientState) -> Self {
        Self { state: Arc::new(RwLock::new(state)) }
    }

    pub fn set(&self, state: AmbientState) {
        *self.state.write() = state;
    }
}

#[async_trait::async_trait]
impl AmbientSource for StaticAmbientSource {
    async fn read(&mut self) -> AmbientState {
        *self.state.read()
    }
}

/// Опрашивает источник и сообщает движку только об изменениях
pub struct AmbientWatcher {
    source: Box<dyn AmbientSource>,
    polling_interval: Duration,
    events: mpsc::Sender<EngineEvent>,
    last: AmbientState,
}

impl AmbientWatcher {
    pub fn new(
        source: Box<dyn AmbientSource>,
        initial: AmbientState,
        polling_interval: Duration,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            source,
            polling_interval,
            events,
            last: initial,
        }
    }

    /// Один опрос; `Some` если состояние изменилось
    pub async fn poll(&mut self) -> Option<AmbientState> {
        let state = self.source.read().await;
        if state == self.last {
            return None;
        }
        self.last = state;
        Some(state)
    }

    pub async fn run(mut self) -> Result<()> {
        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(state) = self.poll().await else {
                continue;
            };

            info!(
                "Внешние сигналы: ночной свет={}, тёмная тема={}",
                state.night_light_active, state.dark_style_active
            );
            if self.events.send(EngineEvent::Ambient(state)).await.is_err() {
                return Ok(());
            }
        }
    }
}
