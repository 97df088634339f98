//! GET /layer - one logical layer of a day, ready for map clients.
//!
//! `layer` selects fires, plume, meta or the fused map; `fmt` only changes
//! the plume layer, which is either a list of KML paths or EsriJSON rings.

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use firesmoke_common::{DataLayout, FeatureCollection, Geometry, IncidentSnapshot};
use fusion::{incident_features, EsriFeatureSet, LayerFusion};
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::{blocking, resolve_day};
use crate::error::{ApiError, ApiResult};
use crate::query::{LayerKind, OutputFormat};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LayerQuery {
    pub day: Option<String>,
    pub layer: Option<String>,
    pub fmt: Option<String>,
}

pub async fn layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LayerQuery>,
) -> ApiResult<Response> {
    let layer: LayerKind = params
        .layer
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("layer is required".to_string()))?
        .parse()?;
    let fmt: OutputFormat = params.fmt.as_deref().unwrap_or_default().parse()?;
    let day = resolve_day(&state, params.day.as_deref().unwrap_or("latest"))?;

    counter!("firesmoke_api_requests_total", "endpoint" => "layer").increment(1);

    let layout = state.layout.clone();
    match layer {
        LayerKind::Fires => blocking(move || fires_layer(&layout, day)).await,
        LayerKind::Plume => blocking(move || plume_layer(&layout, day, fmt)).await,
        LayerKind::Meta => blocking(move || meta_layer(&layout, day)).await,
        LayerKind::Map => {
            // Built on demand; the persisted copy is the pipeline's business.
            blocking(move || Ok(Json(LayerFusion::new(layout).build(day)?).into_response())).await
        }
    }
}

fn fires_layer(layout: &DataLayout, day: NaiveDate) -> ApiResult<Response> {
    let snapshot = IncidentSnapshot::load(&layout.snapshot_path(day), day)?;
    let collection = FeatureCollection::new(format!("FireMap_{}", day))
        .with_features(incident_features(&snapshot));
    Ok(Json(collection).into_response())
}

fn plume_layer(layout: &DataLayout, day: NaiveDate, fmt: OutputFormat) -> ApiResult<Response> {
    let files = layout.plume_files(day)?;
    if files.is_empty() {
        return Err(ApiError::NotFound("No plumes for that day".to_string()));
    }

    match fmt {
        OutputFormat::GeoJson => {
            let urls: Vec<String> = files.iter().map(|p| layout.relative(p)).collect();
            Ok(Json(json!({ "kml_layers": urls })).into_response())
        }
        OutputFormat::EsriJson => {
            let polygons: Vec<Geometry> = files
                .iter()
                .filter_map(|path| match kml_geometry::extract(path) {
                    Ok(Some(ring)) => Some(Geometry::polygon(ring)),
                    Ok(None) => {
                        warn!(path = %path.display(), "Plume artifact has no polygon ring");
                        None
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to read plume artifact");
                        None
                    }
                })
                .collect();
            let features = EsriFeatureSet::from_geometries(&polygons)?;
            Ok(Json(features).into_response())
        }
    }
}

fn meta_layer(layout: &DataLayout, day: NaiveDate) -> ApiResult<Response> {
    let mut bundles = Vec::new();
    for path in layout.bundle_files(day)? {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))?;
        let bundle: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))?;
        bundles.push(bundle);
    }

    if bundles.is_empty() {
        return Err(ApiError::NotFound("No metadata for that day".to_string()));
    }
    Ok(Json(bundles).into_response())
}
