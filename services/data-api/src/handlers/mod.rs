//! HTTP handlers.

pub mod data;
pub mod health;
pub mod layer;

use chrono::NaiveDate;
use firesmoke_common::DaySelector;
use serde_json::Value;
use std::path::Path;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Parse `YYYY-MM-DD` or `latest` and resolve it against the data root.
pub(crate) fn resolve_day(state: &AppState, raw: &str) -> ApiResult<NaiveDate> {
    let selector: DaySelector = raw.parse()?;
    Ok(selector.resolve(&state.layout)?)
}

/// Read a JSON artifact, mapping absence to 404 with `missing` as detail.
pub(crate) async fn read_json(path: &Path, missing: &str) -> ApiResult<Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(missing.to_string()))
        }
        Err(e) => return Err(ApiError::Internal(format!("{}: {}", path.display(), e))),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Internal(format!("{}: {}", path.display(), e)))
}

/// Run filesystem-heavy work off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
