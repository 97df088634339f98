//! Error types for layer fusion.

use firesmoke_common::FireSmokeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error(transparent)]
    Data(#[from] FireSmokeError),

    #[error("Bundle {path} is missing horizons {missing:?}")]
    IncompleteBundle {
        path: PathBuf,
        missing: Vec<&'static str>,
    },

    #[error("Unsupported geometry type for ring projection: {0}")]
    UnsupportedGeometry(&'static str),
}

impl FusionError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            FusionError::Data(e) => e.http_status_code(),
            FusionError::IncompleteBundle { .. } => 500,
            FusionError::UnsupportedGeometry(_) => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, FusionError>;
