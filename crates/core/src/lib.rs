//! Core types and shared functionality for cvetrack.
//!
//! This crate provides:
//! - The record model and admission rules
//! - The remote store abstraction and its SQLite table adapter
//! - The local cache
//! - The registry coordinator that reconciles the two
//! - The view projector used by display layers
//! - Unified error types and configuration

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod registry;
pub mod store;
pub mod validate;
pub mod view;

pub use cache::{LocalCache, SqliteCache};
pub use config::{AppConfig, ConfigError};
pub use db::Db;
pub use error::{Error, RegistryError};
pub use model::{NewRecord, Record, Severity, Status};
pub use registry::{Outcome, Refresh, Registry, RegistryState, SyncMode, SyncWarning};
pub use store::{FieldUpdate, RemoteStore, StoreFailure, StoreResult, TableStore};
pub use validate::{Rejection, validate};
pub use view::{SortField, SortOrder, ViewParams, project};
