//! SQLite-backed local cache.
//!
//! The whole record array is stored as one JSON document under
//! [`CACHE_KEY`](super::CACHE_KEY) in the `local_cache` table.

use async_trait::async_trait;
use std::path::Path;
use tokio_rusqlite::{params, rusqlite};

use super::{CACHE_KEY, LocalCache};
use crate::Error;
use crate::db::Db;
use crate::model::Record;

#[derive(Clone, Debug)]
pub struct SqliteCache {
    db: Db,
    key: String,
}

impl SqliteCache {
    pub fn new(db: Db) -> Self {
        Self { db, key: CACHE_KEY.to_string() }
    }

    /// Device-scoped cache that survives across sessions.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(Db::open(path).await?))
    }

    /// Session-scoped cache that disappears with the handle.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Db::open_in_memory().await?))
    }

    async fn read_raw(&self) -> Result<Option<String>, Error> {
        let key = self.key.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM local_cache WHERE key = ?1")?;
                match stmt.query_row(params![key], |row| row.get(0)) {
                    Ok(json) => Ok(Some(json)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl LocalCache for SqliteCache {
    async fn load(&self) -> Vec<Record> {
        let raw = match self.read_raw().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "local cache unreadable; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "local cache content is not a record array; starting empty");
                Vec::new()
            }
        }
    }

    async fn save(&self, records: &[Record]) -> Result<(), Error> {
        let json = serde_json::to_string(records)?;
        let key = self.key.clone();
        let count = records.len();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO local_cache (key, value, saved_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, saved_at = excluded.saved_at",
                    params![key, json, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(count, "local cache saved");
        Ok(())
    }
}
