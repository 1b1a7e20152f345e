//! HTTP API for the cvetrack registry.
//!
//! Serves the authoritative record table over `/api/cves`. Coordinators talk
//! to it through `cvetrack_client::HttpStore`.

pub mod error;
pub mod handler;
pub mod routes;

pub use error::ApiError;
pub use handler::{AppState, router, run};
