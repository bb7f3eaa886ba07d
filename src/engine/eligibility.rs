use crate::config::{Settings, TargetMonitor};
use crate::events::{MaximizeState, Monitor, Rect, WindowSnapshot};

/// Допуск в логических единицах при сравнении с серединой рабочей области
pub const TILE_TOLERANCE: f64 = 1.0;

/// Глобальный контекст, одинаковый для всех окон в одном проходе
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub settings: &'a Settings,
    pub overview_visible: bool,
    pub global_enabled: bool,
}

impl<'a> EvalContext<'a> {
    pub fn new(settings: &'a Settings, overview_visible: bool) -> Self {
        Self {
            settings,
            overview_visible,
            global_enabled: settings.dimming_enabled,
        }
    }
}

/// Окно прижато к половине экрана?
///
/// Прямого сигнала от композитора нет, поэтому решение принимается по
/// геометрии. Частичная максимизация всегда считается тайлингом.
pub fn is_tiled(window: &WindowSnapshot, work_area: Option<Rect>) -> bool {
    if window.maximize == MaximizeState::Both {
        return false;
    }
    if window.maximize.is_partial() {
        return true;
    }

    let Some(area) = work_area else {
        return false;
    };
    let frame = window.frame;

    let near = |value: i32, mid: f64| (f64::from(value) - mid).abs() <= TILE_TOLERANCE;

    let left_or_right = frame.height == area.height
        && (frame.x == area.x || near(frame.x, area.mid_x()));
    let top_or_bottom = frame.width == area.width
        && (frame.y == area.y || near(frame.y, area.mid_y()));

    left_or_right || top_or_bottom
}

/// Причина, по которой окно-кандидат не затемняется
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Focused,
    GloballyDisabled,
    OverviewVisible,
    NotOnPrimary,
    OnPrimary,
    AlwaysOnTop,
    Maximized,
    Tiled,
}

/// Первая сработавшая причина исключения, `None` если окно нужно затемнить
pub fn exclusion(window: &WindowSnapshot, monitor: Option<&Monitor>, ctx: &EvalContext<'_>) -> Option<Exclusion> {
    let settings = ctx.settings;
    let on_primary = monitor.is_some_and(|m| m.is_primary);
    let work_area = monitor.map(|m| m.work_area);

    if window.has_focus {
        return Some(Exclusion::Focused);
    }
    if !ctx.global_enabled {
        return Some(Exclusion::GloballyDisabled);
    }
    if ctx.overview_visible {
        return Some(Exclusion::OverviewVisible);
    }
    match settings.target_monitor {
        TargetMonitor::Primary if !on_primary => return Some(Exclusion::NotOnPrimary),
        TargetMonitor::Secondary if on_primary => return Some(Exclusion::OnPrimary),
        _ => {}
    }
    if !settings.dim_always_on_top && window.is_above {
        return Some(Exclusion::AlwaysOnTop);
    }
    if !settings.dim_maximized && window.maximize == MaximizeState::Both {
        return Some(Exclusion::Maximized);
    }
    if !settings.dim_tiled && is_tiled(window, work_area) {
        return Some(Exclusion::Tiled);
    }
    None
}

pub fn should_dim(window: &WindowSnapshot, monitor: Option<&Monitor>, ctx: &EvalContext<'_>) -> bool {
    window.window_type.is_candidate() && exclusion(window, monitor, ctx).is_none()
}
