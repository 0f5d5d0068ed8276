use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use larder_common::TrackerError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::repository::StorageError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Anything a request can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    /// Backend failure. `context` is what the caller sees; `source` is only logged.
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Tracker(TrackerError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Tracker(TrackerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Tracker(TrackerError::Authorization(_)) => StatusCode::FORBIDDEN,
            ApiError::Tracker(TrackerError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Tracker(e) => e.to_string(),
            ApiError::Storage { context, .. } => (*context).to_string(),
        }
    }
}

/// Wrap a storage failure with the message the caller should see.
pub fn storage(context: &'static str) -> impl FnOnce(StorageError) -> ApiError {
    move |source| ApiError::Storage { context, source }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage { context, source } = &self {
            error!(error = %source, "{context}");
        }
        (
            self.status(),
            Json(ErrorResponse {
                message: self.message(),
            }),
        )
            .into_response()
    }
}
