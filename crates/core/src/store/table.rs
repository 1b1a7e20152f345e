//! Direct table adapter over the SQLite `records` table.
//!
//! This is the authoritative store when running server side. Database errors
//! surface as `Unreachable`; rows that cannot be decoded (unknown enum text,
//! bad timestamps) surface as `Malformed`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_rusqlite::{params, rusqlite};

use super::{FieldUpdate, RemoteStore, StoreFailure, StoreResult};
use crate::Error;
use crate::db::Db;
use crate::model::{Record, Severity, Status};

const SELECT_COLUMNS: &str = "SELECT id, title, description, severity, status, date_discovered, date_added,
        affected_systems, notes FROM records";

/// A row exactly as stored, before enum and date decoding.
#[derive(Debug)]
struct RawRow {
    id: String,
    title: Option<String>,
    description: String,
    severity: String,
    status: String,
    date_discovered: Option<String>,
    date_added: String,
    affected_systems: Option<String>,
    notes: Option<String>,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            severity: row.get(3)?,
            status: row.get(4)?,
            date_discovered: row.get(5)?,
            date_added: row.get(6)?,
            affected_systems: row.get(7)?,
            notes: row.get(8)?,
        })
    }

    fn decode(self) -> StoreResult<Record> {
        let malformed = |what: &str, err: &dyn std::fmt::Display| {
            StoreFailure::Malformed(format!("record {:?}: bad {what}: {err}", self.id))
        };

        let severity: Severity = self.severity.parse().map_err(|e| malformed("severity", &e))?;
        let status: Status = self.status.parse().map_err(|e| malformed("status", &e))?;
        let date_discovered = match self.date_discovered.as_deref() {
            None | Some("") => None,
            Some(text) => {
                Some(NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| malformed("date_discovered", &e))?)
            }
        };
        let date_added = DateTime::parse_from_rfc3339(&self.date_added)
            .map_err(|e| malformed("date_added", &e))?
            .with_timezone(&Utc);

        Ok(Record {
            id: self.id,
            title: self.title,
            description: self.description,
            severity,
            status,
            date_discovered,
            date_added,
            affected_systems: self.affected_systems,
            notes: self.notes,
        })
    }
}

fn unreachable(err: Error) -> StoreFailure {
    StoreFailure::Unreachable(err.to_string())
}

/// Store adapter writing straight into the `records` table.
#[derive(Clone, Debug)]
pub struct TableStore {
    db: Db,
}

impl TableStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Convenience for tests and ephemeral servers.
    pub async fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Db::open_in_memory().await?))
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Record>> {
        let id = id.to_string();
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Option<RawRow>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
                match stmt.query_row(params![id], RawRow::from_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
            .map_err(unreachable)?;

        raw.map(RawRow::decode).transpose()
    }
}

#[async_trait]
impl RemoteStore for TableStore {
    async fn list_all(&self) -> StoreResult<Vec<Record>> {
        let rows = self
            .db
            .conn
            .call(|conn| -> Result<Vec<RawRow>, Error> {
                let mut stmt = conn.prepare(SELECT_COLUMNS)?;
                let rows = stmt
                    .query_map([], RawRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
            .map_err(unreachable)?;

        tracing::debug!(count = rows.len(), "scanned records table");
        rows.into_iter().map(RawRow::decode).collect()
    }

    async fn put(&self, record: &Record) -> StoreResult<Record> {
        if record.id.trim().is_empty() {
            return Err(StoreFailure::Rejected("id must not be empty".into()));
        }
        if record.description.trim().is_empty() {
            return Err(StoreFailure::Rejected("description must not be empty".into()));
        }

        let stored = record.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (
                    id, title, description, severity, status,
                    date_discovered, date_added, affected_systems, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    severity = excluded.severity,
                    status = excluded.status,
                    date_discovered = excluded.date_discovered,
                    date_added = excluded.date_added,
                    affected_systems = excluded.affected_systems,
                    notes = excluded.notes",
                    params![
                        &stored.id,
                        &stored.title,
                        &stored.description,
                        stored.severity.as_str(),
                        stored.status.as_str(),
                        stored.date_discovered.map(|d| d.format("%Y-%m-%d").to_string()),
                        stored.date_added.to_rfc3339(),
                        &stored.affected_systems,
                        &stored.notes,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
            .map_err(unreachable)?;

        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let key = id.to_string();
        let deleted = self
            .db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                Ok(conn.execute("DELETE FROM records WHERE id = ?1", params![key])?)
            })
            .await
            .map_err(Error::from)
            .map_err(unreachable)?;

        if deleted == 0 {
            return Err(StoreFailure::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_field(&self, id: &str, update: FieldUpdate) -> StoreResult<Record> {
        let key = id.to_string();
        let updated = self
            .db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let changed = match update {
                    FieldUpdate::Status(status) => conn.execute(
                        "UPDATE records SET status = ?1 WHERE id = ?2",
                        params![status.as_str(), key],
                    )?,
                };
                Ok(changed)
            })
            .await
            .map_err(Error::from)
            .map_err(unreachable)?;

        if updated == 0 {
            return Err(StoreFailure::NotFound(id.to_string()));
        }

        self.get(id)
            .await?
            .ok_or_else(|| StoreFailure::NotFound(id.to_string()))
    }
}
