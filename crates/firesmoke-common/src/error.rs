//! Error types for firesmoke data access.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using FireSmokeError.
pub type FireSmokeResult<T> = Result<T, FireSmokeError>;

/// Errors raised while reading or writing the file-backed artifact store.
#[derive(Debug, Error)]
pub enum FireSmokeError {
    // === Query Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("No data available: {0}")]
    NotFound(String),

    // === Data Errors ===
    #[error("Malformed incident feed: {0}")]
    MalformedFeed(String),

    #[error("Malformed incident link '{0}': expected 'q=<lat>,<lon>'")]
    MalformedLink(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FireSmokeError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            FireSmokeError::InvalidParameter { .. } => 400,
            FireSmokeError::NotFound(_) => 404,
            _ => 500,
        }
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        FireSmokeError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}
