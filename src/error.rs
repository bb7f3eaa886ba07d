use crate::events::WindowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DimError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка композитора: {0}")]
    Compositor(#[from] HostError),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl DimError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(DimError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, DimError>;

/// Errors reported by a compositor backend.
///
/// `StaleWindow` is an expected race (the window closed between enumeration
/// and the command) and is never surfaced past the lifecycle manager.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Окно {0} больше не существует")]
    StaleWindow(WindowId),

    #[error("Команда композитора завершилась ошибкой: {0}")]
    Command(String),

    #[error("Не удалось разобрать ответ композитора: {0}")]
    Parse(String),
}

impl HostError {
    pub fn is_stale(&self) -> bool {
        matches!(self, HostError::StaleWindow(_))
    }
}

impl From<serde_json::Error> for HostError {
    fn from(e: serde_json::Error) -> Self {
        HostError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Command(e.to_string())
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! dim_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::DimError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::DimError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::DimError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::DimError::Internal(format!($($arg)*))
    };
}
