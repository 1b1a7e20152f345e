//! HTTP store error types and response mapping.

use cvetrack_core::StoreFailure;
use reqwest::StatusCode;
use serde::Deserialize;

/// Errors building an HTTP store.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured base URL cannot be used.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// `{ "error": "..." }` body returned by the server on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Map a transport-level failure. Timeouts and connection errors alike mean
/// the store could not be reached.
pub(crate) fn transport_failure(err: reqwest::Error) -> StoreFailure {
    if err.is_timeout() {
        StoreFailure::Unreachable(format!("request timed out: {err}"))
    } else if err.is_decode() {
        StoreFailure::Malformed(err.to_string())
    } else {
        StoreFailure::Unreachable(err.to_string())
    }
}

/// Map a non-success HTTP status and its body.
pub(crate) fn status_failure(status: StatusCode, body: &[u8]) -> StoreFailure {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    let message = if message.is_empty() { status.to_string() } else { format!("{status}: {message}") };

    match status {
        StatusCode::NOT_FOUND => StoreFailure::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreFailure::Rejected(message)
        }
        _ => StoreFailure::Unreachable(message),
    }
}
