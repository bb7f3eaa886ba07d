//! Per-window effect attachments.
//!
//! The manager owns a side table `WindowId -> EffectAttachment`. An entry
//! exists exactly while the `dim` effect is attached to the window, and
//! every entry holds one refresh subscription per parameter key.

use crate::config::ConfigKey;
use crate::error::HostError;
use crate::events::{AmbientKey, WindowId};
use crate::services::compositor::{Compositor, DIM_EFFECT_NAME};
use crate::debug_if_enabled;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::resolver::{uniform_value, EffectParam, EffectParams};
use super::signals::{Listener, Signal, SignalBus, SubscriptionId};

/// Количество ключей, от которых зависят параметры эффекта
pub const PARAMETER_KEYS: usize = ConfigKey::EFFECT_PARAMETERS.len() + AmbientKey::ALL.len();

/// Сигналы, на которые подписан каждый затемнённый эффект
fn parameter_signals() -> impl Iterator<Item = Signal> {
    ConfigKey::EFFECT_PARAMETERS
        .into_iter()
        .map(Signal::Config)
        .chain(AmbientKey::ALL.into_iter().map(Signal::Ambient))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectAttachment {
    /// Значения, последний раз переданные в живой эффект
    pub current: EffectParams,
    pub subscriptions: SmallVec<[SubscriptionId; PARAMETER_KEYS]>,
}

#[derive(Debug, Default)]
pub struct EffectLifecycleManager {
    attachments: HashMap<WindowId, EffectAttachment>,
}

impl EffectLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Повесить эффект на окно, если его ещё нет.
    ///
    /// Возвращает `true`, если эффект был действительно добавлен.
    pub fn ensure_dimmed(
        &mut self,
        window: WindowId,
        host: &mut dyn Compositor,
        bus: &mut SignalBus,
        params: EffectParams,
    ) -> bool {
        if self.attachments.contains_key(&window) {
            return false;
        }

        match host.attach_effect(window, DIM_EFFECT_NAME, params.to_uniforms()) {
            Ok(()) => {}
            Err(HostError::StaleWindow(_)) => {
                debug!("Окно {} исчезло до затемнения, пропускаем", window);
                return false;
            }
            Err(e) => {
                warn!("Не удалось затемнить окно {}: {}", window, e);
                return false;
            }
        }

        let subscriptions = parameter_signals()
            .map(|signal| bus.subscribe(signal, Listener::RefreshEffect(window)))
            .collect();

        debug_if_enabled!(
            "Окно {} затемнено: brightness={:.3} saturation={:.3}",
            window,
            params.brightness,
            params.saturation
        );
        self.attachments.insert(window, EffectAttachment { current: params, subscriptions });
        true
    }

    /// Снять эффект и освободить подписки.
    ///
    /// Запись удаляется даже если композитор не смог снять эффект, иначе
    /// подписки пережили бы окно.
    pub fn ensure_undimmed(
        &mut self,
        window: WindowId,
        host: &mut dyn Compositor,
        bus: &mut SignalBus,
    ) -> bool {
        let Some(attachment) = self.attachments.remove(&window) else {
            return false;
        };
        Self::release(&attachment, bus);

        match host.remove_effect(window, DIM_EFFECT_NAME) {
            Ok(()) => debug_if_enabled!("С окна {} снято затемнение", window),
            Err(HostError::StaleWindow(_)) => debug!("Окно {} уже закрыто", window),
            Err(e) => warn!("Не удалось снять затемнение с окна {}: {}", window, e),
        }
        true
    }

    /// Передать в живой эффект изменившиеся параметры.
    ///
    /// Возвращает число обновлённых параметров. Если окно исчезло, запись
    /// забывается.
    pub fn refresh(
        &mut self,
        window: WindowId,
        host: &mut dyn Compositor,
        bus: &mut SignalBus,
        params: EffectParams,
    ) -> usize {
        let Some(attachment) = self.attachments.get_mut(&window) else {
            return 0;
        };

        let mut pushed = 0;
        for param in [EffectParam::Brightness, EffectParam::Saturation] {
            let value = params.get(param);
            if attachment.current.get(param) == value {
                continue;
            }

            match host.set_effect_parameter(window, DIM_EFFECT_NAME, param, uniform_value(value)) {
                Ok(()) => {
                    match param {
                        EffectParam::Brightness => attachment.current.brightness = value,
                        EffectParam::Saturation => attachment.current.saturation = value,
                    }
                    pushed += 1;
                }
                Err(HostError::StaleWindow(_)) => {
                    debug!("Окно {} исчезло во время обновления эффекта", window);
                    self.forget(window, bus);
                    return pushed;
                }
                Err(e) => {
                    warn!(
                        "Не удалось обновить {} для окна {}: {}",
                        param.uniform_name(),
                        window,
                        e
                    );
                }
            }
        }
        pushed
    }

    /// Окно пропало из перечисления: освободить подписки без обращения к композитору
    pub fn forget(&mut self, window: WindowId, bus: &mut SignalBus) -> bool {
        match self.attachments.remove(&window) {
            Some(attachment) => {
                Self::release(&attachment, bus);
                true
            }
            None => false,
        }
    }

    /// Снять эффекты со всех отслеживаемых окон
    pub fn teardown_all(&mut self, host: &mut dyn Compositor, bus: &mut SignalBus) -> usize {
        let windows = self.tracked();
        for window in &windows {
            self.ensure_undimmed(*window, host, bus);
        }
        windows.len()
    }

    fn release(attachment: &EffectAttachment, bus: &mut SignalBus) {
        for id in &attachment.subscriptions {
            bus.unsubscribe(*id);
        }
    }

    pub fn is_dimmed(&self, window: WindowId) -> bool {
        self.attachments.contains_key(&window)
    }

    pub fn attachment(&self, window: WindowId) -> Option<&EffectAttachment> {
        self.attachments.get(&window)
    }

    /// Затемнённые окна по возрастанию идентификатора
    pub fn tracked(&self) -> Vec<WindowId> {
        let mut windows: Vec<WindowId> = self.attachments.keys().copied().collect();
        windows.sort();
        windows
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}
