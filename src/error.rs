//! Error types for the megafacade library.

use thiserror::Error;

use crate::api::error::ApiError;

/// Failures of the facade itself, as opposed to engine results which are
/// reported to listeners as [`ApiError`] values.
#[derive(Error, Debug)]
pub enum MegaError {
    /// Local I/O failure (config file, worker thread spawn).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Engine-level result surfaced through an awaitable completion.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The dispatch thread is gone and can no longer deliver results.
    #[error("Dispatch thread stopped")]
    Stopped,

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for megafacade operations.
pub type Result<T> = std::result::Result<T, MegaError>;
