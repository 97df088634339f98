//! Smoke dispersion for fire incidents.
//!
//! - [`wind`]: forecast wind normalised into the engine's units ([`WindResolver`])
//! - [`nws`]: the National Weather Service lookup behind [`WindLookup`]
//! - [`engine`]: the [`SimulationEngine`] capability and its VSmoke adapter
//! - [`orchestrator`]: three horizons per incident and the bundle write
//!   ([`HorizonOrchestrator`])

pub mod engine;
pub mod error;
pub mod nws;
pub mod orchestrator;
pub mod wind;

pub use engine::{HorizonInput, SimulationEngine, VsmokeEngine};
pub use error::{DispersionError, EngineError, EngineStep, Result};
pub use nws::NwsClient;
pub use orchestrator::{
    BundleStatus, HorizonOrchestrator, HorizonOutcome, HorizonReport, HorizonStage,
    IncidentReport, RunReport,
};
pub use wind::{RawWind, WindLookup, WindResolver};
