//! Raw artifact endpoints: dates, snapshots, plume KML and bundles.

use axum::{
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::Value;
use std::sync::Arc;

use super::{read_json, resolve_day};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// GET /dates - Days with an ingested snapshot, ascending
pub async fn dates_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    counter!("firesmoke_api_requests_total", "endpoint" => "dates").increment(1);
    let days = state.layout.available_days()?;
    Ok(Json(days.iter().map(|d| d.to_string()).collect()))
}

/// GET /fires/:day - Snapshot document as ingested
pub async fn fires_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(day): Path<String>,
) -> ApiResult<Json<Value>> {
    counter!("firesmoke_api_requests_total", "endpoint" => "fires").increment(1);
    let day = resolve_day(&state, &day)?;
    read_json(&state.layout.snapshot_path(day), "No data").await.map(Json)
}

/// GET /plume/:day/:guid.kml - First-horizon plume artifact of one incident
pub async fn plume_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((day, file)): Path<(String, String)>,
) -> ApiResult<Response> {
    counter!("firesmoke_api_requests_total", "endpoint" => "plume").increment(1);
    let day = resolve_day(&state, &day)?;
    let guid = file.strip_suffix(".kml").unwrap_or(&file);

    let Some(path) = state.layout.incident_plume_files(day, guid)?.into_iter().next() else {
        return Err(ApiError::NotFound("Plume not found".to_string()));
    };

    let kml = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))?;
    Ok(([(header::CONTENT_TYPE, KML_CONTENT_TYPE)], kml).into_response())
}

/// GET /meta/:day/:guid - Bundle of one incident
pub async fn meta_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((day, guid)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    counter!("firesmoke_api_requests_total", "endpoint" => "meta").increment(1);
    let day = resolve_day(&state, &day)?;
    read_json(&state.layout.bundle_path(day, &guid), "Metadata not found")
        .await
        .map(Json)
}
