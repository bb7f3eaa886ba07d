use serde::{Deserialize, Serialize};
use std::fmt;

/// Стабильный идентификатор окна (и его актора)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Идентификатор монитора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub u32);

/// Тип окна с точки зрения композитора
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    Normal,
    Dialog,
    ModalDialog,
    Other,
}

impl WindowType {
    /// Только обычные окна и диалоги рассматриваются для затемнения
    pub fn is_candidate(self) -> bool {
        matches!(self, WindowType::Normal | WindowType::Dialog | WindowType::ModalDialog)
    }
}

/// Состояние максимизации окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaximizeState {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl MaximizeState {
    pub fn is_partial(self) -> bool {
        matches!(self, MaximizeState::Horizontal | MaximizeState::Vertical)
    }
}

/// Геометрия прямоугольника в логических единицах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn mid_x(&self) -> f64 {
        f64::from(self.x) + f64::from(self.width) / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Монитор и его рабочая область (без панелей)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    pub is_primary: bool,
    pub work_area: Rect,
}

/// Снимок состояния окна на момент перечисления
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub title: String,
    pub window_type: WindowType,
    pub has_focus: bool,
    pub is_above: bool,
    pub maximize: MaximizeState,
    pub frame: Rect,
    pub monitor: MonitorId,
}

impl WindowSnapshot {
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            window_type: WindowType::Normal,
            has_focus: false,
            is_above: false,
            maximize: MaximizeState::None,
            frame: Rect::default(),
            monitor: MonitorId(0),
        }
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn with_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    pub fn with_above(mut self, is_above: bool) -> Self {
        self.is_above = is_above;
        self
    }

    pub fn with_maximize(mut self, maximize: MaximizeState) -> Self {
        self.maximize = maximize;
        self
    }

    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    pub fn on_monitor(mut self, monitor: MonitorId) -> Self {
        self.monitor = monitor;
        self
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\" ({:?})", self.id, self.title, self.window_type)
    }
}
