// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit rows for every accepted transition.
//!
//! Rows that accompany a status change are built here and handed to
//! [`PackageStore::update_package_status`] so both commit together.
//! [`HistoryRecorder::record`] appends a row on its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use depot_core::{DepotError, HistoryEntry, PackageStatus, PackageStore};

pub const RECEIVED_NARRATIVE: &str = "package received";
pub const EXPIRED_NARRATIVE: &str = "expired automatically";
pub const PURGED_NARRATIVE: &str = "auto soft-deleted after grace period";

pub struct HistoryRecorder {
    store: Arc<dyn PackageStore>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self { store }
    }

    /// Append one immutable row. `actor_id` is `None` for sweep-driven rows.
    pub async fn record(
        &self,
        package_id: &str,
        status: PackageStatus,
        narrative: &str,
        actor_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry, DepotError> {
        let entry = Self::entry(package_id, status, narrative, actor_id, at);
        self.store.append_history(&entry).await?;
        Ok(entry)
    }

    pub fn entry(
        package_id: &str,
        status: PackageStatus,
        narrative: &str,
        actor_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> HistoryEntry {
        HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            package_id: package_id.to_string(),
            status,
            description: narrative.to_string(),
            changed_by: actor_id.map(str::to_string),
            created_at: at,
        }
    }

    pub fn received(package_id: &str, actor_id: &str, at: DateTime<Utc>) -> HistoryEntry {
        Self::entry(
            package_id,
            PackageStatus::Received,
            RECEIVED_NARRATIVE,
            Some(actor_id),
            at,
        )
    }

    pub fn transition(
        package_id: &str,
        from: PackageStatus,
        to: PackageStatus,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> HistoryEntry {
        Self::entry(
            package_id,
            to,
            &format!("status changed from {from} to {to}"),
            Some(actor_id),
            at,
        )
    }

    pub fn expired(package_id: &str, at: DateTime<Utc>) -> HistoryEntry {
        Self::entry(package_id, PackageStatus::Expired, EXPIRED_NARRATIVE, None, at)
    }

    pub fn purged(package_id: &str, at: DateTime<Utc>) -> HistoryEntry {
        Self::entry(package_id, PackageStatus::Deleted, PURGED_NARRATIVE, None, at)
    }
}
