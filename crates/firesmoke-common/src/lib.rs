//! Common types and utilities shared across all firesmoke crates.
//!
//! - [`config`]: the process-wide configuration value, loaded once from YAML
//! - [`types`]: incidents, horizons, wind observations and per-incident bundles
//! - [`geojson`]: the layer-tagged GeoJSON model produced by fusion
//! - [`layout`]: on-disk naming of snapshots, bundles and plume artifacts

pub mod config;
pub mod day;
pub mod error;
pub mod fsutil;
pub mod geojson;
pub mod layout;
pub mod types;

pub use config::FireSmokeConfig;
pub use day::DaySelector;
pub use error::{FireSmokeError, FireSmokeResult};
pub use geojson::{Feature, FeatureCollection, FeatureProperties, Geometry, Layer, Position, Ring};
pub use layout::DataLayout;
pub use types::{
    horizon_catalog, horizon_stem, EmissionParams, HorizonResult, HorizonSpec, Incident,
    IncidentBundle, IncidentSnapshot, WindObservation,
};
