use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ошибка сериализации: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Сервер вернул статус {status}: {body}")]
    ServerStatus { status: u16, body: String },

    #[error("Ошибка инспектора окон: {0}")]
    Inspector(String),

    #[error("Не удалось создать поток событий: {0}")]
    Startup(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl WatcherError {
    pub fn inspector<T>(msg: impl Into<String>) -> Result<T> {
        Err(WatcherError::Inspector(msg.into()))
    }

    /// Ошибки, после которых имеет смысл повторить запрос к серверу
    pub fn is_retryable(&self) -> bool {
        match self {
            WatcherError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            WatcherError::ServerStatus { status, .. } => *status >= 500,
            WatcherError::ServiceUnavailable(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatcherError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! watcher_error {
    (inspector, $($arg:tt)*) => {
        $crate::error::WatcherError::Inspector(format!($($arg)*))
    };
    (startup, $($arg:tt)*) => {
        $crate::error::WatcherError::Startup(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::WatcherError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::WatcherError::Internal(format!($($arg)*))
    };
}
