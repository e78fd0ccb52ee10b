//! Mapping from handler outcomes to HTTP responses.
//!
//! Every error body is `{"detail": "..."}`, including rejected paths and
//! bodies. Storage faults are logged with their cause here and reported to
//! the client with a fixed message only.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use todo_store::StorageFault;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body parsed but failed a field rule.
    #[error("{0}")]
    Validation(String),

    /// The request body was not valid JSON for the endpoint.
    #[error(transparent)]
    Rejected(#[from] JsonRejection),

    /// A path parameter did not parse, such as a non-numeric id.
    #[error(transparent)]
    BadPath(#[from] PathRejection),

    #[error("Todo not found")]
    NotFound,

    #[error("{detail}")]
    Storage {
        detail: &'static str,
        #[source]
        source: StorageFault,
    },

    /// The blocking task running a store call panicked or was cancelled.
    #[error("{0}")]
    Internal(String),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected(rejection) => rejection.status(),
            ApiError::BadPath(rejection) => rejection.status(),
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage { .. } | ApiError::Internal(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Rejected(rejection) => rejection.body_text(),
            ApiError::BadPath(rejection) => rejection.body_text(),
            ApiError::Storage { detail, source } => {
                log::error!("{detail}: {source}");
                detail.to_string()
            }
            ApiError::Internal(message) => {
                log::error!("store task failed: {message}");
                "Internal server error".to_string()
            }
            ApiError::Metrics(err) => {
                log::error!("failed to encode metrics: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
