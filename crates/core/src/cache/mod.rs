//! Local mirror of the canonical record set.
//!
//! The cache is best effort: it is rewritten wholesale after every
//! canonical-set change and only read when the remote store cannot be
//! reached at startup. It is never authoritative while the store answers.

pub mod sqlite;

pub use sqlite::SqliteCache;

use async_trait::async_trait;

use crate::Error;
use crate::model::Record;

/// Storage key the record array lives under.
pub const CACHE_KEY: &str = "cves";

#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Load the last saved set. Unreadable content yields an empty set.
    async fn load(&self) -> Vec<Record>;

    /// Replace the saved set.
    async fn save(&self, records: &[Record]) -> Result<(), Error>;
}
