use crate::engine::{EffectParam, EffectParams};
use crate::error::HostResult;
use crate::events::{Monitor, MonitorId, WindowId, WindowSnapshot};
use crate::mappings::Shortcut;

/// Имя единственного эффекта, который движок вешает на актор окна
pub const DIM_EFFECT_NAME: &str = "dim";

/// Host compositor seam.
///
/// Queries return a consistent snapshot for the duration of one call.
/// Commands addressing a window that no longer exists must fail with
/// `HostError::StaleWindow` so the caller can treat them as a no-op.
pub trait Compositor: Send {
    /// Перечислить все живые окна (и обновить кэш мониторов)
    fn windows(&mut self) -> HostResult<Vec<WindowSnapshot>>;

    fn monitor(&self, id: MonitorId) -> Option<Monitor>;

    fn overview_visible(&self) -> bool;

    fn attach_effect(&mut self, window: WindowId, name: &str, params: EffectParams) -> HostResult<()>;

    fn remove_effect(&mut self, window: WindowId, name: &str) -> HostResult<()>;

    fn set_effect_parameter(
        &mut self,
        window: WindowId,
        name: &str,
        param: EffectParam,
        value: f64,
    ) -> HostResult<()>;

    fn register_keybinding(&mut self, shortcut: &Shortcut) -> HostResult<()>;

    fn unregister_keybinding(&mut self);
}
