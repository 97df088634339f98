//! Application state for the data API.

use firesmoke_common::{DataLayout, FireSmokeConfig};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared application state.
pub struct AppState {
    /// File-backed artifact store every handler reads from.
    pub layout: DataLayout,

    pub config: FireSmokeConfig,

    /// Prometheus recorder handle; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: FireSmokeConfig, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            layout: DataLayout::new(&config.data),
            config,
            metrics,
        }
    }

    /// State over an existing layout with default configuration.
    pub fn with_layout(layout: DataLayout) -> Self {
        Self {
            layout,
            config: FireSmokeConfig::default(),
            metrics: None,
        }
    }
}
