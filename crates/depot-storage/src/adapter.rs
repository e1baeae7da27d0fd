// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use depot_config::model::StorageConfig;
use depot_core::{
    AdapterType, CronLog, CronLogSink, DepotError, DirectoryStore, HealthStatus, HistoryEntry,
    Locker, Owner, Package, PackageStore, PluginAdapter, Recipient, Sender, StatusChange,
    StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed parcel, directory, and cron-log store.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, DepotError> {
        self.db.get().ok_or_else(|| DepotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), DepotError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    pub async fn insert_owner(&self, owner: &Owner) -> Result<(), DepotError> {
        queries::directory::insert_owner(self.db()?, owner).await
    }

    pub async fn insert_sender(&self, sender: &Sender) -> Result<(), DepotError> {
        queries::directory::insert_sender(self.db()?, sender).await
    }

    pub async fn insert_locker(&self, locker: &Locker) -> Result<(), DepotError> {
        queries::directory::insert_locker(self.db()?, locker).await
    }

    pub async fn insert_recipient(&self, recipient: &Recipient) -> Result<(), DepotError> {
        queries::directory::insert_recipient(self.db()?, recipient).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DepotError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DepotError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    async fn initialize(&self) -> Result<(), DepotError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DepotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DepotError> {
        self.db()?;
        self.checkpoint().await
    }
}

#[async_trait]
impl PackageStore for SqliteStore {
    async fn get_package(&self, id: &str) -> Result<Option<Package>, DepotError> {
        queries::packages::get_package(self.db()?, id).await
    }

    async fn get_package_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> Result<Option<Package>, DepotError> {
        queries::packages::get_package_by_tracking_code(self.db()?, tracking_code).await
    }

    async fn create_package(
        &self,
        package: &Package,
        initial: &HistoryEntry,
    ) -> Result<(), DepotError> {
        queries::packages::create_package(self.db()?, package, initial).await
    }

    async fn update_package_status(
        &self,
        change: &StatusChange,
        entry: &HistoryEntry,
    ) -> Result<Package, DepotError> {
        queries::packages::update_package_status(self.db()?, change, entry).await
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), DepotError> {
        queries::history::append_history(self.db()?, entry).await
    }

    async fn list_history(&self, package_id: &str) -> Result<Vec<HistoryEntry>, DepotError> {
        queries::history::list_history(self.db()?, package_id).await
    }

    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Package>, DepotError> {
        queries::packages::find_expirable(self.db()?, now).await
    }

    async fn find_purgeable(&self, cutoff: DateTime<Utc>) -> Result<Vec<Package>, DepotError> {
        queries::packages::find_purgeable(self.db()?, cutoff).await
    }

    async fn count_by_owner_phone(&self, phone: &str) -> Result<u64, DepotError> {
        queries::packages::count_by_owner_phone(self.db()?, phone).await
    }

    async fn list_by_owner_phone(&self, phone: &str) -> Result<Vec<Package>, DepotError> {
        queries::packages::list_by_owner_phone(self.db()?, phone).await
    }

    async fn list_by_owner_phone_between(
        &self,
        phone: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Package>, DepotError> {
        queries::packages::list_by_owner_phone_between(self.db()?, phone, from, until).await
    }
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn get_owner(&self, id: &str) -> Result<Option<Owner>, DepotError> {
        queries::directory::get_owner(self.db()?, id).await
    }

    async fn find_owner_by_phone(&self, phone: &str) -> Result<Option<Owner>, DepotError> {
        queries::directory::find_owner_by_phone(self.db()?, phone).await
    }

    async fn get_sender(&self, id: &str) -> Result<Option<Sender>, DepotError> {
        queries::directory::get_sender(self.db()?, id).await
    }

    async fn get_locker(&self, id: &str) -> Result<Option<Locker>, DepotError> {
        queries::directory::get_locker(self.db()?, id).await
    }

    async fn get_recipient(&self, id: &str) -> Result<Option<Recipient>, DepotError> {
        queries::directory::get_recipient(self.db()?, id).await
    }
}

#[async_trait]
impl CronLogSink for SqliteStore {
    async fn record(&self, log: &CronLog) -> Result<(), DepotError> {
        queries::cron_logs::insert_cron_log(self.db()?, log).await
    }

    async fn recent(
        &self,
        job_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CronLog>, DepotError> {
        queries::cron_logs::recent_cron_logs(self.db()?, job_name, limit).await
    }
}
