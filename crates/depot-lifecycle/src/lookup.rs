// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only parcel queries for the chatbot. Nothing here mutates lifecycle state.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, TimeZone, Utc};
use depot_core::{Clock, DepotError, Package, PackageStore};

use depot_core::normalize_phone;

pub struct PackageLookup {
    store: Arc<dyn PackageStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl PackageLookup {
    pub fn new(store: Arc<dyn PackageStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
        }
    }

    /// Live parcel with this code. Soft-deleted parcels are not found.
    pub async fn find_by_tracking_code(&self, code: &str) -> Result<Option<Package>, DepotError> {
        let code = code.trim().to_ascii_uppercase();
        let found = self.store.get_package_by_tracking_code(&code).await?;
        Ok(found.filter(|p| p.deleted_at.is_none()))
    }

    pub async fn count_by_owner_phone(&self, phone: &str) -> Result<u64, DepotError> {
        self.store.count_by_owner_phone(&phone_key(phone)?).await
    }

    pub async fn list_by_owner_phone(&self, phone: &str) -> Result<Vec<Package>, DepotError> {
        self.store.list_by_owner_phone(&phone_key(phone)?).await
    }

    /// Parcels received since local midnight in office time.
    pub async fn list_today_by_owner_phone(&self, phone: &str) -> Result<Vec<Package>, DepotError> {
        let (from, until) = self.today_bounds()?;
        self.store
            .list_by_owner_phone_between(&phone_key(phone)?, from, until)
            .await
    }

    /// `[local midnight, next local midnight)` as UTC instants.
    pub fn today_bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), DepotError> {
        let local_day = self.clock.now().with_timezone(&self.offset).date_naive();
        let start = local_day
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.offset.from_local_datetime(&midnight).single())
            .ok_or_else(|| DepotError::Internal("cannot compute local midnight".into()))?;
        let end = start
            .checked_add_days(Days::new(1))
            .ok_or_else(|| DepotError::Internal("date out of range".into()))?;
        Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }
}

fn phone_key(raw: &str) -> Result<String, DepotError> {
    normalize_phone(raw).ok_or_else(|| DepotError::Validation(format!("unusable phone number `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_config::model::StorageConfig;
    use depot_core::{
        HistoryEntry, Locker, Owner, PackageStatus, PackageType, Sender, StorageAdapter,
    };
    use depot_storage::SqliteStore;
    use depot_test_utils::ManualClock;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    async fn seeded_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
        let store = SqliteStore::new(StorageConfig {
            database_path: dir.path().join("lookup.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        store.initialize().await.unwrap();
        store
            .insert_owner(&Owner {
                id: "o".into(),
                name: "Sari".into(),
                phone_number: "6281122334455".into(),
            })
            .await
            .unwrap();
        store
            .insert_sender(&Sender {
                id: "s".into(),
                name: "Courier".into(),
                phone_number: None,
            })
            .await
            .unwrap();
        store
            .insert_locker(&Locker {
                id: "l".into(),
                code: "A1".into(),
            })
            .await
            .unwrap();
        Arc::new(store)
    }

    async fn add(store: &SqliteStore, id: &str, code: &str, created: DateTime<Utc>, deleted: bool) {
        let pkg = Package {
            id: id.into(),
            tracking_code: code.into(),
            description: format!("parcel {id}"),
            package_type: PackageType::Other,
            quantity: 1,
            photo: None,
            status: if deleted {
                PackageStatus::Deleted
            } else {
                PackageStatus::Received
            },
            owner_id: "o".into(),
            sender_id: "s".into(),
            locker_id: "l".into(),
            picked_up_by: None,
            proof_image: None,
            completed_at: None,
            expired_at: created + chrono::Duration::days(90),
            deleted_at: deleted.then_some(created),
            created_at: created,
            updated_at: created,
            version: 0,
        };
        let entry = HistoryEntry {
            id: format!("h-{id}"),
            package_id: id.into(),
            status: pkg.status,
            description: "package received".into(),
            changed_by: None,
            created_at: created,
        };
        store.create_package(&pkg, &entry).await.unwrap();
    }

    #[tokio::test]
    async fn today_bounds_follow_office_offset() {
        let dir = tempfile::tempdir().unwrap();
        // 2026-01-09 20:00 UTC is 2026-01-10 03:00 at UTC+7.
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 9, 20, 0, 0).unwrap(),
        ));
        let lookup = PackageLookup::new(seeded_store(&dir).await, clock, offset());

        let (from, until) = lookup.today_bounds().unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 1, 9, 17, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2026, 1, 10, 17, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn phone_queries_normalize_and_skip_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir).await;
        let now = Utc.with_ymd_and_hms(2026, 1, 9, 20, 0, 0).unwrap();
        add(&store, "old", "PACKOLD", now - chrono::Duration::days(3), false).await;
        add(&store, "new", "PACKNEW", now - chrono::Duration::hours(1), false).await;
        add(&store, "gone", "PACKGONE", now - chrono::Duration::hours(2), true).await;

        let lookup = PackageLookup::new(store, Arc::new(ManualClock::new(now)), offset());

        assert_eq!(lookup.count_by_owner_phone("0811-2233-4455").await.unwrap(), 2);
        let all = lookup.list_by_owner_phone("+62 811 2233 4455").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "new");

        let today = lookup.list_today_by_owner_phone("081122334455").await.unwrap();
        let ids: Vec<_> = today.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new"]);

        assert!(lookup.find_by_tracking_code(" packnew ").await.unwrap().is_some());
        assert!(lookup.find_by_tracking_code("PACKGONE").await.unwrap().is_none());
        assert!(matches!(
            lookup.count_by_owner_phone("not a phone").await,
            Err(DepotError::Validation(_))
        ));
    }
}
