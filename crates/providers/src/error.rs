// [crates/providers/src/error.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("provider returned a malformed response: {0}")]
    Protocol(String),

    #[error("permission denied for {0}")]
    Permission(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}
