//! Schema migrations for the record database.
//!
//! Batches are numbered from 1 and applied at most once each, in ascending
//! order, every batch inside its own transaction. `_migrations` keeps one row
//! per applied batch.

use tokio_rusqlite::{Connection, params, rusqlite};

use crate::Error;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "records", sql: include_str!("../../migrations/001_records.sql") },
    Migration { version: 2, name: "local_cache", sql: include_str!("../../migrations/002_local_cache.sql") },
];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Highest applied batch, 0 for a fresh database.
fn schema_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
}

/// Bring the schema up to date.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the batch whose SQL failed; earlier
/// batches stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(VERSION_TABLE)?;
        let current = schema_version(conn)?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            tracing::info!(version = migration.version, name = migration.name, "applied migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tables(conn: &Connection) -> Vec<String> {
        conn.call(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
            let names = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
            Ok::<_, rusqlite::Error>(names)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_twice_is_harmless() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let names = tables(&conn).await;
        assert!(names.iter().any(|n| n == "records"));
        assert!(names.iter().any(|n| n == "local_cache"));
    }

    #[tokio::test]
    async fn test_applied_batches_are_recorded() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let (version, applied) = conn
            .call(|conn| {
                let version = schema_version(conn)?;
                let applied: Vec<String> = conn
                    .prepare("SELECT name FROM _migrations ORDER BY version")?
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<_, _>>()?;
                Ok::<_, rusqlite::Error>((version, applied))
            })
            .await
            .unwrap();

        assert_eq!(version, 2);
        assert_eq!(applied, vec!["records", "local_cache"]);
    }
}
