//! Structured errors for the cvetrack HTTP API.
//!
//! Every failure is rendered as `{ "error": "<message>" }` with a status code
//! derived from the error kind.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cvetrack_core::{Rejection, StoreFailure};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The record failed validation.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The table store failed.
    #[error("{context}: {failure}")]
    Store { context: &'static str, failure: StoreFailure },
}

impl ApiError {
    pub fn store(context: &'static str, failure: StoreFailure) -> Self {
        ApiError::Store { context, failure }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Store { failure: StoreFailure::NotFound(_), .. } => StatusCode::NOT_FOUND,
            ApiError::Store { failure: StoreFailure::Rejected(_), .. } => StatusCode::BAD_REQUEST,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request refused");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
