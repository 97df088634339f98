//! Error types for the ingestion crate.

use firesmoke_common::FireSmokeError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Failed to parse feed XML: {0}")]
    Xml(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Data(#[from] FireSmokeError),

    #[error("Failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for IngestionError {
    fn from(e: quick_xml::Error) -> Self {
        IngestionError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for IngestionError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        IngestionError::Xml(e.to_string())
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
