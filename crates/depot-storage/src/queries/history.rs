// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only status history.

use depot_core::{DepotError, HistoryEntry};
use rusqlite::params;

use super::{fmt_ts, get_enum, get_ts};
use crate::database::{Database, map_tr_err};

pub(crate) fn insert_history_row(
    conn: &rusqlite::Connection,
    entry: &HistoryEntry,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO package_history (id, package_id, status, description, changed_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id,
            entry.package_id,
            entry.status.to_string(),
            entry.description,
            entry.changed_by,
            fmt_ts(entry.created_at),
        ],
    )?;
    Ok(())
}

/// Append a standalone history row.
pub async fn append_history(db: &Database, entry: &HistoryEntry) -> Result<(), DepotError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| insert_history_row(conn, &entry))
        .await
        .map_err(map_tr_err)
}

/// All rows for a parcel, oldest first. Rows written in the same
/// millisecond keep insertion order.
pub async fn list_history(
    db: &Database,
    package_id: &str,
) -> Result<Vec<HistoryEntry>, DepotError> {
    let package_id = package_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<HistoryEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, package_id, status, description, changed_by, created_at
                 FROM package_history WHERE package_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![package_id], |row| {
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    package_id: row.get(1)?,
                    status: get_enum(row, 2)?,
                    description: row.get(3)?,
                    changed_by: row.get(4)?,
                    created_at: get_ts(row, 5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
