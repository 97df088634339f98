//! Error types for the dispersion crate.

use firesmoke_common::FireSmokeError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the weather lookup and the orchestration around the engine.
#[derive(Error, Debug)]
pub enum DispersionError {
    #[error("Weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Weather service returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Empty hourly forecast for {lat},{lon}")]
    EmptyForecast { lat: f64, lon: f64 },

    #[error("Unexpected weather payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Data(#[from] FireSmokeError),
}

/// Failure of one engine invocation. Output of the failing process is kept verbatim.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start {step} {program}: {source}")]
    Spawn {
        step: EngineStep,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Solver exited with {code:?}:\n{output}")]
    SolverFailed { code: Option<i32>, output: String },

    #[error("Converter exited with {code:?}:\n{output}")]
    ConverterFailed { code: Option<i32>, output: String },

    #[error("{step} timed out after {secs}s")]
    Timeout { step: EngineStep, secs: u64 },

    #[error("Converter produced no artifact at {0}")]
    MissingArtifact(PathBuf),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write engine input: {0}")]
    Input(#[from] FireSmokeError),
}

/// The two external steps of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStep {
    Solver,
    Converter,
}

impl std::fmt::Display for EngineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineStep::Solver => write!(f, "solver"),
            EngineStep::Converter => write!(f, "converter"),
        }
    }
}

impl EngineError {
    /// Which step failed; `None` when the failure happened before either ran.
    pub fn step(&self) -> Option<EngineStep> {
        match self {
            EngineError::SolverFailed { .. } => Some(EngineStep::Solver),
            EngineError::ConverterFailed { .. } | EngineError::MissingArtifact(_) => {
                Some(EngineStep::Converter)
            }
            EngineError::Timeout { step, .. } | EngineError::Spawn { step, .. } => Some(*step),
            EngineError::Io(_) | EngineError::Input(_) => None,
        }
    }
}

/// Result type for dispersion operations.
pub type Result<T> = std::result::Result<T, DispersionError>;
