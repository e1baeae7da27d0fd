// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parcel reads, inserts, and version-guarded status writes.

use chrono::{DateTime, Utc};
use depot_core::{DepotError, HistoryEntry, Package, StatusChange, normalize_phone};
use rusqlite::{OptionalExtension, params};

use super::history::insert_history_row;
use super::{fmt_opt_ts, fmt_ts, get_enum, get_opt_ts, get_ts};
use crate::database::{Database, map_tr_err};

const PACKAGE_COLUMNS: &str = "p.id, p.tracking_code, p.description, p.package_type, p.quantity, \
     p.photo, p.status, p.owner_id, p.sender_id, p.locker_id, p.picked_up_by, p.proof_image, \
     p.completed_at, p.expired_at, p.deleted_at, p.created_at, p.updated_at, p.version";

fn package_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        tracking_code: row.get(1)?,
        description: row.get(2)?,
        package_type: get_enum(row, 3)?,
        quantity: row.get(4)?,
        photo: row.get(5)?,
        status: get_enum(row, 6)?,
        owner_id: row.get(7)?,
        sender_id: row.get(8)?,
        locker_id: row.get(9)?,
        picked_up_by: row.get(10)?,
        proof_image: row.get(11)?,
        completed_at: get_opt_ts(row, 12)?,
        expired_at: get_ts(row, 13)?,
        deleted_at: get_opt_ts(row, 14)?,
        created_at: get_ts(row, 15)?,
        updated_at: get_ts(row, 16)?,
        version: row.get(17)?,
    })
}

fn select_packages<P: rusqlite::Params>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: P,
) -> rusqlite::Result<Vec<Package>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, package_from_row)?;
    rows.collect()
}

fn select_package_by_id(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Package>> {
    conn.query_row(
        &format!("SELECT {PACKAGE_COLUMNS} FROM packages p WHERE p.id = ?1"),
        params![id],
        package_from_row,
    )
    .optional()
}

/// Insert a parcel and its first history row in one transaction.
pub async fn create_package(
    db: &Database,
    package: &Package,
    initial: &HistoryEntry,
) -> Result<(), DepotError> {
    let pkg = package.clone();
    let entry = initial.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let taken: bool = tx
                .query_row(
                    "SELECT 1 FROM packages WHERE tracking_code = ?1",
                    params![pkg.tracking_code],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if taken {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO packages (id, tracking_code, description, package_type, quantity,
                    photo, status, owner_id, sender_id, locker_id, picked_up_by, proof_image,
                    completed_at, expired_at, deleted_at, created_at, updated_at, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    pkg.id,
                    pkg.tracking_code,
                    pkg.description,
                    pkg.package_type.to_string(),
                    pkg.quantity,
                    pkg.photo,
                    pkg.status.to_string(),
                    pkg.owner_id,
                    pkg.sender_id,
                    pkg.locker_id,
                    pkg.picked_up_by,
                    pkg.proof_image,
                    fmt_opt_ts(pkg.completed_at),
                    fmt_ts(pkg.expired_at),
                    fmt_opt_ts(pkg.deleted_at),
                    fmt_ts(pkg.created_at),
                    fmt_ts(pkg.updated_at),
                    pkg.version,
                ],
            )?;
            insert_history_row(&tx, &entry)?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(DepotError::Validation(format!(
            "tracking code {} is already in use",
            package.tracking_code
        )))
    }
}

/// Get a parcel by id, including soft-deleted ones.
pub async fn get_package(db: &Database, id: &str) -> Result<Option<Package>, DepotError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_package_by_id(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Get a parcel by tracking code, including soft-deleted ones.
pub async fn get_package_by_tracking_code(
    db: &Database,
    tracking_code: &str,
) -> Result<Option<Package>, DepotError> {
    let code = tracking_code.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PACKAGE_COLUMNS} FROM packages p WHERE p.tracking_code = ?1"),
                params![code],
                package_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

enum StatusWrite {
    Applied(Package),
    Stale,
    Missing,
}

/// Apply `change` and append `entry`, or neither.
///
/// The row is only touched when its version still equals
/// `change.expected_version`; the version is bumped on success.
pub async fn update_package_status(
    db: &Database,
    change: &StatusChange,
    entry: &HistoryEntry,
) -> Result<Package, DepotError> {
    let c = change.clone();
    let entry = entry.clone();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<StatusWrite, rusqlite::Error> {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE packages
                 SET status = ?1, completed_at = ?2, deleted_at = ?3, picked_up_by = ?4,
                     proof_image = ?5, updated_at = ?6, version = version + 1
                 WHERE id = ?7 AND version = ?8",
                params![
                    c.status.to_string(),
                    fmt_opt_ts(c.completed_at),
                    fmt_opt_ts(c.deleted_at),
                    c.picked_up_by,
                    c.proof_image,
                    fmt_ts(c.updated_at),
                    c.package_id,
                    c.expected_version,
                ],
            )?;
            if updated == 0 {
                let exists = select_package_by_id(&tx, &c.package_id)?.is_some();
                return Ok(if exists {
                    StatusWrite::Stale
                } else {
                    StatusWrite::Missing
                });
            }
            insert_history_row(&tx, &entry)?;
            let pkg = select_package_by_id(&tx, &c.package_id)?
                .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(StatusWrite::Applied(pkg))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        StatusWrite::Applied(pkg) => Ok(pkg),
        StatusWrite::Stale => Err(DepotError::Conflict {
            package_id: change.package_id.clone(),
        }),
        StatusWrite::Missing => Err(DepotError::not_found("package", &change.package_id)),
    }
}

/// Live, non-terminal parcels whose retention deadline is before `now`.
pub async fn find_expirable(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<Package>, DepotError> {
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| {
            select_packages(
                conn,
                &format!(
                    "SELECT {PACKAGE_COLUMNS} FROM packages p
                     WHERE p.deleted_at IS NULL
                       AND p.status NOT IN ('completed', 'expired', 'deleted')
                       AND p.expired_at < ?1
                     ORDER BY p.expired_at ASC"
                ),
                params![now],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Expired parcels whose last status write is before `cutoff`.
pub async fn find_purgeable(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Package>, DepotError> {
    let cutoff = fmt_ts(cutoff);
    db.connection()
        .call(move |conn| {
            select_packages(
                conn,
                &format!(
                    "SELECT {PACKAGE_COLUMNS} FROM packages p
                     WHERE p.deleted_at IS NULL
                       AND p.status = 'expired'
                       AND p.updated_at < ?1
                     ORDER BY p.updated_at ASC"
                ),
                params![cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Owner phones are stored normalised; an unusable number matches nothing.
fn owner_phone_key(phone: &str) -> String {
    normalize_phone(phone).unwrap_or_else(|| phone.trim().to_string())
}

/// Number of live parcels owned by the user with `phone`.
pub async fn count_by_owner_phone(db: &Database, phone: &str) -> Result<u64, DepotError> {
    let phone = owner_phone_key(phone);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM packages p JOIN owners o ON o.id = p.owner_id
                 WHERE o.phone_number = ?1 AND p.deleted_at IS NULL",
                params![phone],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map_err(map_tr_err)
        .map(|n| n.max(0) as u64)
}

/// Live parcels owned by the user with `phone`, newest first.
pub async fn list_by_owner_phone(db: &Database, phone: &str) -> Result<Vec<Package>, DepotError> {
    let phone = owner_phone_key(phone);
    db.connection()
        .call(move |conn| {
            select_packages(
                conn,
                &format!(
                    "SELECT {PACKAGE_COLUMNS} FROM packages p JOIN owners o ON o.id = p.owner_id
                     WHERE o.phone_number = ?1 AND p.deleted_at IS NULL
                     ORDER BY p.created_at DESC"
                ),
                params![phone],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Live parcels owned by the user with `phone` received in `[from, until)`.
pub async fn list_by_owner_phone_between(
    db: &Database,
    phone: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<Package>, DepotError> {
    let phone = owner_phone_key(phone);
    let (from, until) = (fmt_ts(from), fmt_ts(until));
    db.connection()
        .call(move |conn| {
            select_packages(
                conn,
                &format!(
                    "SELECT {PACKAGE_COLUMNS} FROM packages p JOIN owners o ON o.id = p.owner_id
                     WHERE o.phone_number = ?1 AND p.deleted_at IS NULL
                       AND p.created_at >= ?2 AND p.created_at < ?3
                     ORDER BY p.created_at DESC"
                ),
                params![phone, from, until],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::queries::{directory, history};
    use chrono::TimeZone;
    use depot_core::{Locker, Owner, PackageStatus, PackageType, Sender};
    use tempfile::tempdir;

    pub(crate) async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        directory::insert_owner(
            &db,
            &Owner {
                id: "owner-1".into(),
                name: "Sari".into(),
                phone_number: "6281110000001".into(),
            },
        )
        .await
        .unwrap();
        directory::insert_sender(
            &db,
            &Sender {
                id: "sender-1".into(),
                name: "Courier Co".into(),
                phone_number: None,
            },
        )
        .await
        .unwrap();
        directory::insert_locker(
            &db,
            &Locker {
                id: "locker-1".into(),
                code: "A-01".into(),
            },
        )
        .await
        .unwrap();
        (db, dir)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
    }

    pub(crate) fn make_package(id: &str, code: &str) -> Package {
        Package {
            id: id.to_string(),
            tracking_code: code.to_string(),
            description: "Shoe box".to_string(),
            package_type: PackageType::Item,
            quantity: 1,
            photo: None,
            status: PackageStatus::Received,
            owner_id: "owner-1".to_string(),
            sender_id: "sender-1".to_string(),
            locker_id: "locker-1".to_string(),
            picked_up_by: None,
            proof_image: None,
            completed_at: None,
            expired_at: t0() + chrono::Duration::days(90),
            deleted_at: None,
            created_at: t0(),
            updated_at: t0(),
            version: 0,
        }
    }

    fn entry(package_id: &str, status: PackageStatus, actor: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            package_id: package_id.to_string(),
            status,
            description: format!("moved to {status}"),
            changed_by: actor.map(str::to_string),
            created_at: t0(),
        }
    }

    #[tokio::test]
    async fn create_and_get_package_roundtrips() {
        let (db, _dir) = setup_db().await;
        let pkg = make_package("p-1", "PACK0001");

        create_package(&db, &pkg, &entry("p-1", PackageStatus::Received, Some("admin")))
            .await
            .unwrap();

        let by_id = get_package(&db, "p-1").await.unwrap().unwrap();
        assert_eq!(by_id, pkg);
        let by_code = get_package_by_tracking_code(&db, "PACK0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_code.id, "p-1");

        let rows = history::list_history(&db, "p-1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].changed_by.as_deref(), Some("admin"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_package_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_package(&db, "nope").await.unwrap().is_none());
        assert!(get_package_by_tracking_code(&db, "NOPE").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_tracking_code_is_validation_error_and_writes_nothing() {
        let (db, _dir) = setup_db().await;
        create_package(
            &db,
            &make_package("p-1", "DUP"),
            &entry("p-1", PackageStatus::Received, None),
        )
        .await
        .unwrap();

        let err = create_package(
            &db,
            &make_package("p-2", "DUP"),
            &entry("p-2", PackageStatus::Received, None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DepotError::Validation(_)));
        assert!(get_package(&db, "p-2").await.unwrap().is_none());
        assert!(history::list_history(&db, "p-2").await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_update_bumps_version_and_appends_history() {
        let (db, _dir) = setup_db().await;
        let pkg = make_package("p-1", "PACK1");
        create_package(&db, &pkg, &entry("p-1", PackageStatus::Received, None))
            .await
            .unwrap();

        let later = t0() + chrono::Duration::hours(2);
        let change = StatusChange::from_package(&pkg, PackageStatus::Processing, later);
        let updated = update_package_status(
            &db,
            &change,
            &entry("p-1", PackageStatus::Processing, Some("admin")),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, PackageStatus::Processing);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.updated_at, later);
        let rows = history::list_history(&db, "p-1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].status, PackageStatus::Processing);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_version_is_conflict_and_writes_nothing() {
        let (db, _dir) = setup_db().await;
        let pkg = make_package("p-1", "PACK1");
        create_package(&db, &pkg, &entry("p-1", PackageStatus::Received, None))
            .await
            .unwrap();

        let first = StatusChange::from_package(&pkg, PackageStatus::Processing, t0());
        let second = StatusChange::from_package(&pkg, PackageStatus::Delivered, t0());
        update_package_status(&db, &first, &entry("p-1", PackageStatus::Processing, None))
            .await
            .unwrap();
        let err = update_package_status(&db, &second, &entry("p-1", PackageStatus::Delivered, None))
            .await
            .unwrap_err();

        assert!(matches!(err, DepotError::Conflict { ref package_id } if package_id == "p-1"));
        let stored = get_package(&db, "p-1").await.unwrap().unwrap();
        assert_eq!(stored.status, PackageStatus::Processing);
        assert_eq!(history::list_history(&db, "p-1").await.unwrap().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_package_is_not_found() {
        let (db, _dir) = setup_db().await;
        let ghost = make_package("ghost", "GHOST");
        let change = StatusChange::from_package(&ghost, PackageStatus::Processing, t0());
        let err = update_package_status(&db, &change, &entry("ghost", PackageStatus::Processing, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DepotError::NotFound { entity: "package", .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn expirable_selection_skips_terminal_and_future_rows() {
        let (db, _dir) = setup_db().await;
        let mut due = make_package("due", "C1");
        due.status = PackageStatus::Delivered;
        let mut not_yet = make_package("not-yet", "C2");
        not_yet.expired_at = t0() + chrono::Duration::days(200);
        let mut done = make_package("done", "C3");
        done.status = PackageStatus::Completed;
        let mut already = make_package("already", "C4");
        already.status = PackageStatus::Expired;
        let mut gone = make_package("gone", "C5");
        gone.status = PackageStatus::Deleted;
        gone.deleted_at = Some(t0());

        for pkg in [&due, &not_yet, &done, &already, &gone] {
            create_package(&db, pkg, &entry(&pkg.id, pkg.status, None))
                .await
                .unwrap();
        }

        let found = find_expirable(&db, t0() + chrono::Duration::days(91))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["due"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn purgeable_selection_uses_last_update() {
        let (db, _dir) = setup_db().await;
        let mut old = make_package("old", "E1");
        old.status = PackageStatus::Expired;
        old.updated_at = t0();
        let mut fresh = make_package("fresh", "E2");
        fresh.status = PackageStatus::Expired;
        fresh.updated_at = t0() + chrono::Duration::days(10);
        let live = make_package("live", "E3");

        for pkg in [&old, &fresh, &live] {
            create_package(&db, pkg, &entry(&pkg.id, pkg.status, None))
                .await
                .unwrap();
        }

        let found = find_purgeable(&db, t0() + chrono::Duration::days(5))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "old");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn phone_lookups_exclude_deleted_and_respect_range() {
        let (db, _dir) = setup_db().await;
        let first = make_package("a", "P-A");
        let mut second = make_package("b", "P-B");
        second.created_at = t0() + chrono::Duration::days(1);
        let mut deleted = make_package("c", "P-C");
        deleted.status = PackageStatus::Deleted;
        deleted.deleted_at = Some(t0());

        for pkg in [&first, &second, &deleted] {
            create_package(&db, pkg, &entry(&pkg.id, pkg.status, None))
                .await
                .unwrap();
        }

        assert_eq!(count_by_owner_phone(&db, "6281110000001").await.unwrap(), 2);
        assert_eq!(count_by_owner_phone(&db, "0811-1000-0001").await.unwrap(), 2);
        assert_eq!(count_by_owner_phone(&db, "620000").await.unwrap(), 0);

        let all = list_by_owner_phone(&db, "6281110000001").await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let day_two = list_by_owner_phone_between(
            &db,
            "6281110000001",
            t0() + chrono::Duration::hours(12),
            t0() + chrono::Duration::hours(36),
        )
        .await
        .unwrap();
        assert_eq!(day_two.len(), 1);
        assert_eq!(day_two[0].id, "b");
        db.close().await.unwrap();
    }
}
