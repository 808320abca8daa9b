//! Error types for fxchat.

use thiserror::Error;

use crate::exchange::FetchError;

/// Common error type for fxchat.
#[derive(Error, Debug)]
pub enum FxChatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for configuration or user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Exchange rate lookup failed.
    #[error("exchange error: {0}")]
    Fetch(#[from] FetchError),

    /// HTTP client setup error.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type alias for fxchat operations.
pub type Result<T> = std::result::Result<T, FxChatError>;
