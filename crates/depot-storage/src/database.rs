// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use depot_core::DepotError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, DepotError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, DepotError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DepotError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| DepotError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => DepotError::Storage {
                    source: Box::new(other),
                },
            })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), DepotError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage variant.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DepotError {
    DepotError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_and_enables_wal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("depot.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let (journal, tables) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let journal: String =
                    conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let tables: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('packages', 'package_history', 'cron_logs', 'owners')",
                    [],
                    |row| row.get(0),
                )?;
                Ok((journal, tables))
            })
            .await
            .unwrap();

        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(tables, 4);
        assert!(path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depot.db");
        let path = path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_rows_cannot_be_rewritten() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();

        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "INSERT INTO owners (id, name, phone_number) VALUES ('o', 'O', '62811');
                     INSERT INTO senders (id, name) VALUES ('s', 'S');
                     INSERT INTO lockers (id, code) VALUES ('l', 'L1');
                     INSERT INTO packages (id, tracking_code, description, package_type, quantity,
                        status, owner_id, sender_id, locker_id, expired_at, created_at, updated_at)
                     VALUES ('p', 'PACK1', 'box', 'item', 1, 'received', 'o', 's', 'l',
                        '2026-04-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z',
                        '2026-01-01T00:00:00.000Z');
                     INSERT INTO package_history (id, package_id, status, description, created_at)
                     VALUES ('h', 'p', 'received', 'package received', '2026-01-01T00:00:00.000Z');",
                )?;
                conn.execute("UPDATE package_history SET description = 'x'", [])?;
                Ok(())
            })
            .await;

        assert!(result.is_err(), "history update must be rejected");
        db.close().await.unwrap();
    }
}
