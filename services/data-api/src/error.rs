//! Error responses for the data API.
//!
//! Every failure is rendered as `{"detail": "..."}`. Internal failures are
//! logged in full and reported to the client with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use firesmoke_common::FireSmokeError;
use fusion::error::FusionError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn from_status(code: u16, message: String) -> Self {
        match code {
            400 => ApiError::BadRequest(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<FireSmokeError> for ApiError {
    fn from(e: FireSmokeError) -> Self {
        ApiError::from_status(e.http_status_code(), e.to_string())
    }
}

impl From<FusionError> for ApiError {
    fn from(e: FusionError) -> Self {
        ApiError::from_status(e.http_status_code(), e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let bad: ApiError = FireSmokeError::invalid_parameter("day", "nope").into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = FireSmokeError::NotFound("no ingested days".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let broken: ApiError = FusionError::IncompleteBundle {
            path: "meta/x.json".into(),
            missing: vec!["2.5h"],
        }
        .into();
        assert_eq!(broken.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
