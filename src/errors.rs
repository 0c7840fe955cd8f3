use thiserror::Error;

use crate::pricing::validation::FieldError;

/// Ошибки конфигурации при чтении переменных окружения.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Ошибки обращения к pro API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Circuit Breaker в состоянии Open и блокирует запрос.
    #[error("circuit breaker is open - pro API temporarily unavailable")]
    CircuitOpen,
    /// Ошибка HTTP-клиента (сеть, таймаут, десериализация).
    #[error("pro API request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Сервер ответил статусом не из 2xx.
    #[error("pro API answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Ошибки сценария сохранения тарифов.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Локальная проверка формы не прошла, в сеть ничего не ушло.
    #[error("price categories are invalid ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),
    #[error("persistence failed: {0}")]
    Persistence(#[from] ApiError),
}
