// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use depot_core::{CronLog, DepotError};
use rusqlite::params;

use super::{fmt_ts, get_enum, get_ts};
use crate::database::{Database, map_tr_err};

pub async fn insert_cron_log(db: &Database, log: &CronLog) -> Result<(), DepotError> {
    let log = log.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO cron_logs (id, job_name, status, message, executed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    log.id,
                    log.job_name,
                    log.status.to_string(),
                    log.message,
                    fmt_ts(log.executed_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Newest first. `job_name` of `None` returns every job.
pub async fn recent_cron_logs(
    db: &Database,
    job_name: Option<&str>,
    limit: usize,
) -> Result<Vec<CronLog>, DepotError> {
    let job_name = job_name.map(str::to_string);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<CronLog>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, job_name, status, message, executed_at FROM cron_logs
                 WHERE ?1 IS NULL OR job_name = ?1
                 ORDER BY executed_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![job_name, limit], |row| {
                Ok(CronLog {
                    id: row.get(0)?,
                    job_name: row.get(1)?,
                    status: get_enum(row, 2)?,
                    message: row.get(3)?,
                    executed_at: get_ts(row, 4)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
