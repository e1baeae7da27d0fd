// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules and the row codecs they share.

pub mod cron_logs;
pub mod directory;
pub mod history;
pub mod packages;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Fixed-width UTC timestamps, so text ordering equals time ordering.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub(crate) fn fmt_ts(t: DateTime<Utc>) -> String {
    t.format(TS_FORMAT).to_string()
}

pub(crate) fn fmt_opt_ts(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(fmt_ts)
}

pub(crate) fn get_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

pub(crate) fn get_opt_ts(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a text column into any strum-parsed enum.
pub(crate) fn get_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::milliseconds(1500);
        assert_eq!(fmt_ts(early), "2026-01-02T03:04:05.000Z");
        assert_eq!(fmt_ts(late), "2026-01-02T03:04:06.500Z");
        assert!(fmt_ts(early) < fmt_ts(late));
        assert_eq!(parse_ts(0, &fmt_ts(late)).unwrap(), late);
    }
}
