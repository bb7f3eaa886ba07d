//! Typed publish/subscribe between event sources and the engine.
//!
//! Every subscription is identified by an opaque [`SubscriptionId`] that the
//! owner must release explicitly. Signals form a closed tag set, there is no
//! string-keyed dispatch.

use crate::config::ConfigKey;
use crate::events::{AmbientKey, WindowId};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Источник уведомления
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Config(ConfigKey),
    Ambient(AmbientKey),
    WindowCreated,
    WindowsChanged,
    Focus(WindowId),
    OverviewShown,
    OverviewHidden,
    ToggleShortcut,
}

/// Что сделать при срабатывании сигнала
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Полный проход согласования по всем окнам
    Reconcile,
    /// Пересчитать параметры живого эффекта окна
    RefreshEffect(WindowId),
    /// Переключить `dimming-enabled`
    ToggleDimming,
    /// Перерегистрировать горячую клавишу
    RebindShortcut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct SignalBus {
    next_id: u64,
    subscriptions: HashMap<SubscriptionId, (Signal, Listener)>,
    by_signal: HashMap<Signal, SmallVec<[SubscriptionId; 4]>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Подписать `listener` на `signal`.
    ///
    /// Повторная подписка той же пары не создаёт дубликат и возвращает
    /// существующий идентификатор.
    pub fn subscribe(&mut self, signal: Signal, listener: Listener) -> SubscriptionId {
        if let Some(existing) = self.find(signal, listener) {
            return existing;
        }

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.insert(id, (signal, listener));
        self.by_signal.entry(signal).or_default().push(id);
        id
    }

    /// Освободить подписку; `false` если она уже была освобождена
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some((signal, _)) = self.subscriptions.remove(&id) else {
            return false;
        };

        if let Some(ids) = self.by_signal.get_mut(&signal) {
            ids.retain(|candidate| *candidate != id);
            if ids.is_empty() {
                self.by_signal.remove(&signal);
            }
        }
        true
    }

    pub fn find(&self, signal: Signal, listener: Listener) -> Option<SubscriptionId> {
        self.by_signal.get(&signal).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| self.subscriptions.get(id).map(|(_, l)| *l) == Some(listener))
        })
    }

    /// Слушатели сигнала в порядке подписки
    pub fn listeners(&self, signal: Signal) -> impl Iterator<Item = Listener> + '_ {
        self.by_signal
            .get(&signal)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.subscriptions.get(id).map(|(_, listener)| *listener))
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_dispatch_order() {
        let mut bus = SignalBus::new();
        let signal = Signal::Config(ConfigKey::Brightness);
        bus.subscribe(signal, Listener::RefreshEffect(WindowId(1)));
        bus.subscribe(signal, Listener::Reconcile);
        bus.subscribe(Signal::WindowCreated, Listener::Reconcile);

        let listeners: Vec<_> = bus.listeners(signal).collect();
        assert_eq!(listeners, vec![Listener::RefreshEffect(WindowId(1)), Listener::Reconcile]);
        assert_eq!(bus.len(), 3);
    }

    #[test]
    fn test_duplicate_subscription_is_noop() {
        let mut bus = SignalBus::new();
        let first = bus.subscribe(Signal::Focus(WindowId(3)), Listener::Reconcile);
        let second = bus.subscribe(Signal::Focus(WindowId(3)), Listener::Reconcile);

        assert_eq!(first, second);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_unsubscribe_releases_once() {
        let mut bus = SignalBus::new();
        let id = bus.subscribe(Signal::OverviewShown, Listener::Reconcile);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());
        assert_eq!(bus.listeners(Signal::OverviewShown).count(), 0);
    }
}
