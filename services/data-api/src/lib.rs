//! Data API Service Library
//!
//! Read-only HTTP access to the artifact store: ingested snapshots, plume
//! KML, incident bundles and the per-layer views map clients consume.

pub mod error;
pub mod handlers;
pub mod query;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the router with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Raw artifacts
        .route("/dates", get(handlers::data::dates_handler))
        .route("/fires/:day", get(handlers::data::fires_handler))
        .route("/plume/:day/:file", get(handlers::data::plume_handler))
        .route("/meta/:day/:guid", get(handlers::data::meta_handler))
        // Map layers
        .route("/layer", get(handlers::layer::layer_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
