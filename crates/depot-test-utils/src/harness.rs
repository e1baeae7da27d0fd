// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end lifecycle testing.
//!
//! `TestHarness` assembles the full lifecycle stack over a temp SQLite
//! database, a [`MockChannel`], and a [`ManualClock`], with a small
//! directory already seeded.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use depot_config::model::{DepotConfig, LifecycleConfig, NotificationConfig, StorageConfig};
use depot_core::{
    DepotError, DirectoryStore, Locker, NewPackage, NotificationChannel, Owner, Package,
    PackageStore, Recipient, Sender, StorageAdapter,
};
use depot_lifecycle::{
    ChatbotResponder, Composer, KeywordIntentExtractor, LifecycleService, Notifier,
    PackageLookup, PackageNotifier, SweepRunner, office_offset,
};
use depot_storage::SqliteStore;

use crate::clock::ManualClock;
use crate::mock_channel::MockChannel;

pub const OWNER_ID: &str = "owner-1";
pub const OWNER_PHONE: &str = "6281234567890";
pub const OTHER_OWNER_ID: &str = "owner-2";
pub const OTHER_OWNER_PHONE: &str = "6289876543210";
pub const SENDER_ID: &str = "sender-1";
pub const LOCKER_ID: &str = "locker-1";
pub const RECIPIENT_ID: &str = "recipient-1";
pub const CLERK_ID: &str = "clerk-1";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    transitions: Option<BTreeMap<String, Vec<String>>>,
    channel: Option<MockChannel>,
    start: DateTime<Utc>,
    backoff: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            transitions: None,
            channel: None,
            start: Utc
                .with_ymd_and_hms(2026, 1, 10, 2, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            backoff: Duration::from_millis(10),
        }
    }

    /// Replace the default transition table.
    pub fn with_transitions(mut self, table: BTreeMap<String, Vec<String>>) -> Self {
        self.transitions = Some(table);
        self
    }

    /// Use a pre-scripted mock channel.
    pub fn with_channel(mut self, channel: MockChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Start the manual clock at `start`.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Wait between a failed send and its retry.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, DepotError> {
        // Create temp directory for SQLite
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| DepotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let sqlite = Arc::new(SqliteStore::new(storage_config.clone()));
        sqlite.initialize().await?;
        seed_directory(&sqlite).await?;

        let lifecycle_config = LifecycleConfig {
            transitions: self.transitions,
            ..LifecycleConfig::default()
        };
        let notification_config = NotificationConfig {
            retry_backoff_ms: u64::try_from(self.backoff.as_millis()).unwrap_or(u64::MAX),
            send_timeout_secs: 2,
            ..NotificationConfig::default()
        };
        let config = DepotConfig {
            storage: storage_config,
            lifecycle: lifecycle_config,
            notification: notification_config,
            ..DepotConfig::default()
        };

        let clock = Arc::new(ManualClock::new(self.start));
        let channel = Arc::new(self.channel.unwrap_or_default());
        let store: Arc<dyn PackageStore> = sqlite.clone();
        let directory: Arc<dyn DirectoryStore> = sqlite.clone();

        let composer = Composer::new(
            config.lifecycle.office_name.clone(),
            config.lifecycle.utc_offset_hours,
        );
        let dyn_channel: Arc<dyn NotificationChannel> = channel.clone();
        let notifier = Arc::new(PackageNotifier::new(
            directory.clone(),
            composer.clone(),
            Notifier::from_config(Some(dyn_channel), &config.notification),
        ));

        let service = Arc::new(LifecycleService::new(
            store.clone(),
            directory.clone(),
            notifier.clone(),
            clock.clone(),
            &config.lifecycle,
        )?);
        let sweeps = Arc::new(SweepRunner::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            config.lifecycle.grace_days,
        ));
        let lookup = Arc::new(PackageLookup::new(
            store.clone(),
            clock.clone(),
            office_offset(config.lifecycle.utc_offset_hours),
        ));
        let chatbot = Arc::new(ChatbotResponder::new(
            lookup.clone(),
            directory,
            Arc::new(KeywordIntentExtractor::new(&config.lifecycle.tracking_prefix)),
            composer,
        ));

        Ok(TestHarness {
            store: sqlite,
            channel,
            clock,
            service,
            sweeps,
            lookup,
            notifier,
            chatbot,
            config,
            _temp_dir: temp_dir,
        })
    }
}

async fn seed_directory(store: &SqliteStore) -> Result<(), DepotError> {
    store
        .insert_owner(&Owner {
            id: OWNER_ID.into(),
            name: "Sari".into(),
            phone_number: OWNER_PHONE.into(),
        })
        .await?;
    store
        .insert_owner(&Owner {
            id: OTHER_OWNER_ID.into(),
            name: "Budi".into(),
            phone_number: OTHER_OWNER_PHONE.into(),
        })
        .await?;
    store
        .insert_sender(&Sender {
            id: SENDER_ID.into(),
            name: "JNE Express".into(),
            phone_number: None,
        })
        .await?;
    store
        .insert_locker(&Locker {
            id: LOCKER_ID.into(),
            code: "A-01".into(),
        })
        .await?;
    store
        .insert_recipient(&Recipient {
            id: RECIPIENT_ID.into(),
            name: "Rina".into(),
            phone_number: None,
        })
        .await
}

/// A fully assembled lifecycle stack for integration tests.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub channel: Arc<MockChannel>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<LifecycleService>,
    pub sweeps: Arc<SweepRunner>,
    pub lookup: Arc<PackageLookup>,
    pub notifier: Arc<PackageNotifier>,
    pub chatbot: Arc<ChatbotResponder>,
    pub config: DepotConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Details for a parcel addressed to the seeded owner.
    pub fn new_package(description: &str) -> NewPackage {
        NewPackage {
            tracking_code: None,
            description: description.to_string(),
            package_type: "item".into(),
            quantity: 1,
            photo: None,
            owner_id: OWNER_ID.into(),
            sender_id: SENDER_ID.into(),
            locker_id: LOCKER_ID.into(),
        }
    }

    /// Receive a parcel for the seeded owner as the seeded clerk.
    pub async fn receive(&self, description: &str) -> Result<Package, DepotError> {
        self.service
            .receive_package(Self::new_package(description), CLERK_ID)
            .await
    }

    /// Reload a parcel straight from the database.
    pub async fn reload(&self, package_id: &str) -> Result<Package, DepotError> {
        self.store
            .get_package(package_id)
            .await?
            .ok_or_else(|| DepotError::not_found("package", package_id))
    }
}
