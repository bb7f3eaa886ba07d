use crate::engine::{EffectParam, EffectParams};
use crate::error::{HostError, HostResult};
use crate::events::{MaximizeState, Monitor, MonitorId, Rect, WindowId, WindowSnapshot, WindowType};
use crate::mappings::Shortcut;
use crate::services::shortcut_listener::ShortcutWatch;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use super::r#trait::Compositor;

/// Эффект, висящий на акторе окна
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedEffect {
    pub name: String,
    pub params: EffectParams,
}

#[derive(Debug, Default)]
struct SimulatedState {
    windows: Vec<WindowSnapshot>,
    monitors: Vec<Monitor>,
    overview_visible: bool,
    effects: HashMap<WindowId, Vec<AttachedEffect>>,
    stale: HashSet<WindowId>,
    keybinding: Option<Shortcut>,
    shared_keybinding: Option<ShortcutWatch>,
    parameter_pushes: usize,
}

/// In-memory compositor used by `--dry-run` and by the engine tests.
///
/// Cloning yields another handle onto the same window table, so a detector
/// can keep mutating windows while the engine owns its own handle.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCompositor {
    state: Arc<RwLock<SimulatedState>>,
}

impl SimulatedCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Два монитора и четыре окна для режима сухого запуска
    pub fn demo() -> Self {
        let compositor = Self::new();
        let primary = Rect::new(0, 32, 1920, 1048);
        compositor.add_monitor(Monitor { id: MonitorId(0), is_primary: true, work_area: primary });
        compositor.add_monitor(Monitor {
            id: MonitorId(1),
            is_primary: false,
            work_area: Rect::new(1920, 0, 1280, 1024),
        });

        compositor.add_window(
            WindowSnapshot::new(WindowId(1), "Terminal - dry_run")
                .with_frame(Rect::new(0, 32, 960, 1048))
                .with_focus(true),
        );
        compositor.add_window(
            WindowSnapshot::new(WindowId(2), "Browser - dry_run")
                .with_frame(primary)
                .with_maximize(MaximizeState::Both),
        );
        compositor.add_window(
            WindowSnapshot::new(WindowId(3), "Editor - dry_run")
                .with_frame(Rect::new(2000, 100, 900, 700))
                .on_monitor(MonitorId(1)),
        );
        compositor.add_window(
            WindowSnapshot::new(WindowId(4), "Notifications - dry_run")
                .with_type(WindowType::Other)
                .with_above(true),
        );
        compositor
    }

    pub fn add_monitor(&self, monitor: Monitor) {
        let mut state = self.state.write();
        state.monitors.retain(|m| m.id != monitor.id);
        state.monitors.push(monitor);
    }

    pub fn add_window(&self, window: WindowSnapshot) {
        let mut state = self.state.write();
        state.stale.remove(&window.id);
        state.windows.retain(|w| w.id != window.id);
        state.windows.push(window);
    }

    /// Окно исчезает без уведомления, как в реальном композиторе
    pub fn remove_window(&self, id: WindowId) {
        let mut state = self.state.write();
        state.windows.retain(|w| w.id != id);
        state.effects.remove(&id);
    }

    /// Окно ещё перечисляется, но его актор уже уничтожен
    pub fn mark_stale(&self, id: WindowId) {
        self.state.write().stale.insert(id);
    }

    pub fn update_window(&self, id: WindowId, update: impl FnOnce(&mut WindowSnapshot)) {
        let mut state = self.state.write();
        if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
            update(window);
        }
    }

    /// Передать фокус окну; `None` снимает фокус со всех окон
    pub fn focus(&self, id: Option<WindowId>) {
        let mut state = self.state.write();
        for window in state.windows.iter_mut() {
            window.has_focus = Some(window.id) == id;
        }
    }

    pub fn set_overview_visible(&self, visible: bool) {
        self.state.write().overview_visible = visible;
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.state.read().windows.iter().map(|w| w.id).collect()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.state.read().windows.iter().find(|w| w.has_focus).map(|w| w.id)
    }

    pub fn effects(&self, id: WindowId) -> Vec<AttachedEffect> {
        self.state.read().effects.get(&id).cloned().unwrap_or_default()
    }

    pub fn effect(&self, id: WindowId) -> Option<EffectParams> {
        self.effects(id).first().map(|effect| effect.params)
    }

    /// Окна с хотя бы одним эффектом, по возрастанию идентификатора
    pub fn dimmed(&self) -> Vec<WindowId> {
        let state = self.state.read();
        let mut ids: Vec<WindowId> = state
            .effects
            .iter()
            .filter(|(_, effects)| !effects.is_empty())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Публиковать зарегистрированную комбинацию ещё и слушателю клавиатуры
    pub fn share_keybinding(&self, watch: ShortcutWatch) {
        self.state.write().shared_keybinding = Some(watch);
    }

    pub fn keybinding(&self) -> Option<Shortcut> {
        self.state.read().keybinding.clone()
    }

    pub fn parameter_pushes(&self) -> usize {
        self.state.read().parameter_pushes
    }

    fn live(state: &SimulatedState, id: WindowId) -> HostResult<()> {
        if state.stale.contains(&id) || !state.windows.iter().any(|w| w.id == id) {
            return Err(HostError::StaleWindow(id));
        }
        Ok(())
    }
}

impl Compositor for SimulatedCompositor {
    fn windows(&mut self) -> HostResult<Vec<WindowSnapshot>> {
        Ok(self.state.read().windows.clone())
    }

    fn monitor(&self, id: MonitorId) -> Option<Monitor> {
        self.state.read().monitors.iter().find(|m| m.id == id).copied()
    }

    fn overview_visible(&self) -> bool {
        self.state.read().overview_visible
    }

    fn attach_effect(&mut self, window: WindowId, name: &str, params: EffectParams) -> HostResult<()> {
        let mut state = self.state.write();
        Self::live(&state, window)?;
        state.effects.entry(window).or_default().push(AttachedEffect {
            name: name.to_string(),
            params,
        });
        Ok(())
    }

    fn remove_effect(&mut self, window: WindowId, name: &str) -> HostResult<()> {
        let mut state = self.state.write();
        Self::live(&state, window)?;
        if let Some(effects) = state.effects.get_mut(&window) {
            effects.retain(|effect| effect.name != name);
            if effects.is_empty() {
                state.effects.remove(&window);
            }
        }
        Ok(())
    }

    fn set_effect_parameter(
        &mut self,
        window: WindowId,
        name: &str,
        param: EffectParam,
        value: f64,
    ) -> HostResult<()> {
        let mut state = self.state.write();
        Self::live(&state, window)?;
        let effect = state
            .effects
            .get_mut(&window)
            .and_then(|effects| effects.iter_mut().find(|effect| effect.name == name))
            .ok_or_else(|| HostError::Command(format!("эффект '{}' не найден на окне {}", name, window)))?;

        match param {
            EffectParam::Brightness => effect.params.brightness = value,
            EffectParam::Saturation => effect.params.saturation = value,
        }
        state.parameter_pushes += 1;
        Ok(())
    }

    fn register_keybinding(&mut self, shortcut: &Shortcut) -> HostResult<()> {
        info!("[DRY RUN] Регистрация горячей клавиши {}", shortcut);
        let mut state = self.state.write();
        state.keybinding = Some(shortcut.clone());
        if let Some(watch) = &state.shared_keybinding {
            *watch.write() = Some(shortcut.clone());
        }
        Ok(())
    }

    fn unregister_keybinding(&mut self) {
        let mut state = self.state.write();
        state.keybinding = None;
        if let Some(watch) = &state.shared_keybinding {
            *watch.write() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_on_missing_window_are_stale() {
        let mut compositor = SimulatedCompositor::new();
        let params = EffectParams { brightness: 0.5, saturation: 1.0 };

        let err = compositor.attach_effect(WindowId(9), "dim", params).unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_focus_moves_between_windows() {
        let compositor = SimulatedCompositor::demo();
        assert_eq!(compositor.focused(), Some(WindowId(1)));

        compositor.focus(Some(WindowId(3)));
        assert_eq!(compositor.focused(), Some(WindowId(3)));

        compositor.focus(None);
        assert_eq!(compositor.focused(), None);
    }

    #[test]
    fn test_keybinding_is_shared_with_listener() {
        let mut compositor = SimulatedCompositor::new();
        let watch = crate::services::shortcut_listener::new_shortcut_watch();
        compositor.share_keybinding(watch.clone());

        let shortcut = Shortcut::parse("<Super>d").unwrap();
        compositor.register_keybinding(&shortcut).unwrap();
        assert_eq!(watch.read().as_ref(), Some(&shortcut));

        compositor.unregister_keybinding();
        assert!(watch.read().is_none());
        assert!(compositor.keybinding().is_none());
    }

    #[test]
    fn test_removed_window_loses_effects() {
        let mut compositor = SimulatedCompositor::demo();
        let params = EffectParams { brightness: 0.5, saturation: 1.0 };
        compositor.attach_effect(WindowId(2), "dim", params).unwrap();
        assert_eq!(compositor.dimmed(), vec![WindowId(2)]);

        compositor.remove_window(WindowId(2));
        assert!(compositor.dimmed().is_empty());
        assert!(!compositor.window_ids().contains(&WindowId(2)));
    }
}
