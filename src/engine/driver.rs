//! Global reconciliation driver.
//!
//! `Engine` owns the compositor handle, the signal bus and the effect
//! side table. It is driven by one task that feeds it `EngineEvent`s one at
//! a time; every event is handled to completion before the next one.

use crate::config::{ConfigKey, Settings};
use crate::events::{AmbientKey, AmbientState, EngineEvent, WindowId};
use crate::mappings::{Shortcut, ShortcutStatus};
use crate::services::compositor::Compositor;
use crate::debug_if_enabled;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::eligibility::{should_dim, EvalContext};
use super::lifecycle::EffectLifecycleManager;
use super::resolver::{resolve, EffectParams};
use super::signals::{Listener, Signal, SignalBus, SubscriptionId};

/// Итог одного прохода согласования
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub windows: usize,
    pub dimmed: Vec<WindowId>,
    pub undimmed: Vec<WindowId>,
    pub vanished: Vec<WindowId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.dimmed.is_empty() && self.undimmed.is_empty() && self.vanished.is_empty()
    }
}

pub struct Engine {
    host: Box<dyn Compositor>,
    settings: Settings,
    /// Последние настройки, прочитанные из файла, до правок движка
    file_settings: Settings,
    ambient: AmbientState,
    bus: SignalBus,
    effects: EffectLifecycleManager,
    /// Подписки уровня движка, освобождаются в `disable`
    global: SmallVec<[SubscriptionId; 32]>,
    /// Слушатель фокуса для каждого уже увиденного окна
    observed: HashMap<WindowId, SubscriptionId>,
    overview_visible: bool,
    shortcut: ShortcutStatus,
    enabled: bool,
}

impl Engine {
    pub fn new(host: Box<dyn Compositor>, settings: Settings, ambient: AmbientState) -> Self {
        Self {
            host,
            file_settings: settings.clone(),
            settings,
            ambient,
            bus: SignalBus::new(),
            effects: EffectLifecycleManager::new(),
            global: SmallVec::new(),
            observed: HashMap::new(),
            overview_visible: false,
            shortcut: ShortcutStatus::Unset,
            enabled: false,
        }
    }

    /// Подписаться на все глобальные сигналы и выполнить первый проход
    pub fn enable(&mut self) -> ReconcileReport {
        if self.enabled {
            return ReconcileReport::default();
        }
        info!("Включение движка затемнения");

        let mut global = SmallVec::new();
        for signal in [
            Signal::WindowCreated,
            Signal::WindowsChanged,
            Signal::OverviewShown,
            Signal::OverviewHidden,
        ] {
            global.push(self.bus.subscribe(signal, Listener::Reconcile));
        }
        global.push(self.bus.subscribe(Signal::ToggleShortcut, Listener::ToggleDimming));

        for key in ConfigKey::ALL {
            let listener = match key {
                ConfigKey::ToggleShortcut => Listener::RebindShortcut,
                _ => Listener::Reconcile,
            };
            global.push(self.bus.subscribe(Signal::Config(key), listener));
        }
        for key in AmbientKey::ALL {
            global.push(self.bus.subscribe(Signal::Ambient(key), Listener::Reconcile));
        }
        self.global = global;

        self.enabled = true;
        self.overview_visible = self.host.overview_visible();
        self.bind_shortcut();

        let report = self.reconcile_all();
        info!(
            "Движок включён: окон {}, затемнено {}, подписок {}",
            report.windows,
            self.effects.len(),
            self.bus.len()
        );
        report
    }

    /// Снять все эффекты и освободить все подписки
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }

        let removed = self.effects.teardown_all(self.host.as_mut(), &mut self.bus);
        for (_, id) in self.observed.drain() {
            self.bus.unsubscribe(id);
        }
        for id in self.global.drain(..) {
            self.bus.unsubscribe(id);
        }
        self.host.unregister_keybinding();

        self.enabled = false;
        info!("Движок выключен, снято эффектов: {}", removed);
        if !self.bus.is_empty() {
            warn!("После выключения осталось подписок: {}", self.bus.len());
        }
    }

    /// Обработать одно событие от производителей
    pub fn handle_event(&mut self, event: EngineEvent) {
        debug_if_enabled!("Событие движка: {:?}", event);

        let signals: SmallVec<[Signal; 8]> = match event {
            EngineEvent::WindowCreated(_) => smallvec::smallvec![Signal::WindowCreated],
            EngineEvent::WindowsChanged(_) => smallvec::smallvec![Signal::WindowsChanged],
            EngineEvent::FocusChanged(window) => {
                if self.enabled && !self.observed.contains_key(&window) {
                    // Окно ещё не видели: его слушателя нет, но проход нужен
                    debug!("Фокус на неизвестном окне {}", window);
                    self.dispatch_listeners(vec![Listener::Reconcile]);
                    return;
                }
                smallvec::smallvec![Signal::Focus(window)]
            }
            EngineEvent::OverviewShown => {
                self.overview_visible = true;
                smallvec::smallvec![Signal::OverviewShown]
            }
            EngineEvent::OverviewHidden => {
                self.overview_visible = false;
                smallvec::smallvec![Signal::OverviewHidden]
            }
            EngineEvent::SettingsReloaded(settings) => {
                let next = self.merge_reloaded(*settings);
                let changed = self.settings.changed_keys(&next);
                self.settings = next;
                if !changed.is_empty() {
                    info!(
                        "Изменены настройки: {}",
                        changed.iter().map(|key| key.name()).collect::<Vec<_>>().join(", ")
                    );
                }
                changed.into_iter().map(Signal::Config).collect()
            }
            EngineEvent::Ambient(state) => {
                let changed = self.ambient.changed_keys(&state);
                self.ambient = state;
                changed.into_iter().map(Signal::Ambient).collect()
            }
            EngineEvent::ToggleShortcut => smallvec::smallvec![Signal::ToggleShortcut],
        };

        self.dispatch(&signals);
    }

    /// Собрать слушателей всех сигналов и выполнить каждого один раз
    pub fn dispatch(&mut self, signals: &[Signal]) {
        let listeners = self.collect_listeners(signals);
        self.dispatch_listeners(listeners);
    }

    fn collect_listeners(&self, signals: &[Signal]) -> Vec<Listener> {
        let mut seen = HashSet::new();
        signals
            .iter()
            .flat_map(|signal| self.bus.listeners(*signal))
            .filter(|listener| seen.insert(*listener))
            .collect()
    }

    fn dispatch_listeners(&mut self, mut listeners: Vec<Listener>) {
        if listeners.is_empty() {
            return;
        }

        let params = self.params();
        for listener in &listeners {
            if let Listener::RefreshEffect(window) = listener {
                self.effects.refresh(*window, self.host.as_mut(), &mut self.bus, params);
            }
        }

        // Переключение пишет `dimming-enabled` и порождает его сигнал
        if listeners.contains(&Listener::ToggleDimming) {
            self.settings.dimming_enabled = !self.settings.dimming_enabled;
            info!(
                "Затемнение {} горячей клавишей",
                if self.settings.dimming_enabled { "включено" } else { "выключено" }
            );
            for listener in self.collect_listeners(&[Signal::Config(ConfigKey::DimmingEnabled)]) {
                if !listeners.contains(&listener) {
                    listeners.push(listener);
                }
            }
        }

        if listeners.contains(&Listener::RebindShortcut) {
            self.bind_shortcut();
        }

        if listeners.contains(&Listener::Reconcile) {
            let report = self.reconcile_all();
            if !report.is_noop() {
                debug!(
                    "Проход согласования: +{} -{} исчезло {}",
                    report.dimmed.len(),
                    report.undimmed.len(),
                    report.vanished.len()
                );
            }
        }
    }

    /// Полный проход по всем перечисленным окнам
    pub fn reconcile_all(&mut self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if !self.enabled {
            return report;
        }

        let windows = match self.host.windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось перечислить окна: {}", e);
                return report;
            }
        };
        report.windows = windows.len();

        let params = self.params();
        let ctx = EvalContext::new(&self.settings, self.overview_visible);
        let mut present = HashSet::with_capacity(windows.len());

        for window in &windows {
            present.insert(window.id);

            let bus = &mut self.bus;
            self.observed
                .entry(window.id)
                .or_insert_with(|| bus.subscribe(Signal::Focus(window.id), Listener::Reconcile));

            let monitor = self.host.monitor(window.monitor);
            if should_dim(window, monitor.as_ref(), &ctx) {
                if self.effects.ensure_dimmed(window.id, self.host.as_mut(), &mut self.bus, params) {
                    report.dimmed.push(window.id);
                }
            } else if self.effects.ensure_undimmed(window.id, self.host.as_mut(), &mut self.bus) {
                report.undimmed.push(window.id);
            }
        }

        let vanished: Vec<WindowId> = self
            .observed
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        for window in vanished {
            if let Some(id) = self.observed.remove(&window) {
                self.bus.unsubscribe(id);
            }
            self.effects.forget(window, &mut self.bus);
            debug_if_enabled!("Окно {} исчезло, подписки освобождены", window);
            report.vanished.push(window);
        }
        report.vanished.sort();

        report
    }

    /// Перерегистрировать горячую клавишу из текущих настроек.
    ///
    /// Неразборчивая комбинация сбрасывается в «нет комбинации».
    pub fn bind_shortcut(&mut self) -> &ShortcutStatus {
        self.host.unregister_keybinding();

        let text = self
            .settings
            .toggle_shortcut
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        self.shortcut = match text {
            None => ShortcutStatus::Unset,
            Some(text) => match Shortcut::parse(&text) {
                Ok(shortcut) => {
                    match self.host.register_keybinding(&shortcut) {
                        Ok(()) => info!("Горячая клавиша переключения: {}", shortcut),
                        Err(e) => warn!("Не удалось зарегистрировать {}: {}", shortcut, e),
                    }
                    ShortcutStatus::Valid(shortcut)
                }
                Err(reason) => {
                    warn!("Неверная горячая клавиша '{}': {}, сброшена", text, reason);
                    self.settings.toggle_shortcut = None;
                    ShortcutStatus::Invalid { text, reason }
                }
            },
        };
        &self.shortcut
    }

    /// Значения, которые движок пишет сам (переключатель и сброс комбинации),
    /// берутся из файла только когда они изменились в самом файле
    fn merge_reloaded(&mut self, reloaded: Settings) -> Settings {
        let mut next = reloaded.clone();
        if reloaded.dimming_enabled == self.file_settings.dimming_enabled {
            next.dimming_enabled = self.settings.dimming_enabled;
        }
        if reloaded.toggle_shortcut == self.file_settings.toggle_shortcut {
            next.toggle_shortcut = self.settings.toggle_shortcut.clone();
        }
        self.file_settings = reloaded;
        next
    }

    fn params(&self) -> EffectParams {
        resolve(&self.settings, &self.ambient)
    }

    /// Обрабатывать события, пока не придёт `shutdown` или не закроется канал.
    ///
    /// Движок при выходе не выключается, это делает вызывающий.
    pub async fn run<F>(&mut self, events: &mut mpsc::Receiver<EngineEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Получен сигнал завершения");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Все производители событий остановлены");
                        break;
                    }
                },
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ambient(&self) -> AmbientState {
        self.ambient
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn shortcut_status(&self) -> &ShortcutStatus {
        &self.shortcut
    }

    pub fn subscription_count(&self) -> usize {
        self.bus.len()
    }

    pub fn attachment_count(&self) -> usize {
        self.effects.len()
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn dimmed_windows(&self) -> Vec<WindowId> {
        self.effects.tracked()
    }
}
