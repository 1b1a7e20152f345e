//! Client code for cvetrack.
//!
//! This crate provides the HTTP remote store used by display layers that
//! reach the registry through its API rather than the table directly.

pub mod http;

pub use http::{ClientError, HttpStore, HttpStoreConfig};
