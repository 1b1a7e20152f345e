//! Unified error types for cvetrack.
//!
//! `Error` covers local plumbing (SQLite, serialization, migrations).
//! Remote-store outcomes live in [`crate::store::StoreFailure`] and
//! registry-level refusals in [`RegistryError`].

use tokio_rusqlite::rusqlite;

use crate::validate::Rejection;

/// Storage and plumbing errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("DB_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("DB_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be encoded or decoded.
    #[error("SERIALIZATION: {0}")]
    Serialization(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Intents the coordinator refuses before touching any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The candidate record failed validation.
    #[error("VALIDATION_REJECTED: {0}")]
    Rejected(#[from] Rejection),

    /// The intent targets an id absent from the canonical set.
    #[error("UNKNOWN_RECORD: {0}")]
    UnknownRecord(String),

    /// The registry has not finished its initial load.
    #[error("NOT_READY: registry is still loading")]
    NotReady,
}
