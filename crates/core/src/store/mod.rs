//! Remote store abstraction.
//!
//! The coordinator talks to the authoritative store only through
//! [`RemoteStore`]. Two adapters exist: [`TableStore`] writes straight to the
//! SQLite `records` table (server side), and `HttpStore` in `cvetrack-client`
//! speaks the `/api/cves` HTTP surface.
//!
//! Every operation returns `Result<_, StoreFailure>`; adapters never let a
//! foreign error type escape.

pub mod table;

pub use table::TableStore;

use async_trait::async_trait;

use crate::model::{Record, Status};

/// Uniform failure kinds reported by any store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreFailure {
    /// The call could not complete (transport, timeout, database down).
    #[error("UNREACHABLE: {0}")]
    Unreachable(String),

    /// The store answered with something that could not be decoded.
    #[error("MALFORMED: {0}")]
    Malformed(String),

    /// The store refused the write.
    #[error("REJECTED: {0}")]
    Rejected(String),

    /// The targeted key does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
}

impl StoreFailure {
    /// Short tag used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreFailure::Unreachable(_) => "unreachable",
            StoreFailure::Malformed(_) => "malformed",
            StoreFailure::Rejected(_) => "rejected",
            StoreFailure::NotFound(_) => "not_found",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreFailure>;

/// A single-field mutation. Status is the only field a record lets change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    Status(Status),
}

impl FieldUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldUpdate::Status(_) => "status",
        }
    }

    /// Apply the update to a record, returning the mutated copy.
    pub fn apply(&self, record: &Record) -> Record {
        match self {
            FieldUpdate::Status(status) => record.with_status(*status),
        }
    }
}

/// Capability set of the authoritative store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Full scan. No ordering is implied.
    async fn list_all(&self) -> StoreResult<Vec<Record>>;

    /// Store-level upsert. Callers enforce uniqueness before calling.
    async fn put(&self, record: &Record) -> StoreResult<Record>;

    /// Remove a key. Adapters may report `NotFound` for an absent key.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Mutate one field and return the updated record.
    async fn update_field(&self, id: &str, update: FieldUpdate) -> StoreResult<Record>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        (**self).list_all().await
    }

    async fn put(&self, record: &Record) -> StoreResult<Record> {
        (**self).put(record).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn update_field(&self, id: &str, update: FieldUpdate) -> StoreResult<Record> {
        (**self).update_field(id, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_and_kind() {
        let failure = StoreFailure::Unreachable("connection refused".into());
        assert!(failure.to_string().starts_with("UNREACHABLE"));
        assert_eq!(failure.kind(), "unreachable");
        assert_eq!(StoreFailure::NotFound("CVE-1".into()).kind(), "not_found");
    }

    #[test]
    fn test_field_update_name() {
        assert_eq!(FieldUpdate::Status(Status::Resolved).field_name(), "status");
    }
}
