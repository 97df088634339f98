//! Layer fusion and alternate ring projection.
//!
//! [`LayerFusion`] reads a day's incident snapshot and incident bundles and
//! produces one flat, layer-tagged GeoJSON collection. [`esri`] re-renders
//! polygon geometry in the EsriJSON ring convention.

pub mod error;
pub mod esri;
pub mod layers;

pub use error::{FusionError, Result};
pub use esri::{project, swap_axes, EsriFeatureSet};
pub use layers::{incident_features, FusionOutput, LayerFusion};
