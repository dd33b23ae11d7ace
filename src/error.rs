//! Error types for the redaction engine

use thiserror::Error;

/// Errors surfaced to the caller of the redaction engine
#[derive(Debug, Error)]
pub enum RedactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<RedactError> for String {
    fn from(e: RedactError) -> Self {
        e.to_string()
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
