// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parcel persistence consumed by the lifecycle engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DepotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{HistoryEntry, Package, StatusChange};

/// Durable parcel store.
///
/// Lookups return `Ok(None)` when the row does not exist, so "not found" is
/// never confused with a backend failure.
#[async_trait]
pub trait PackageStore: PluginAdapter {
    async fn get_package(&self, id: &str) -> Result<Option<Package>, DepotError>;

    async fn get_package_by_tracking_code(
        &self,
        tracking_code: &str,
    ) -> Result<Option<Package>, DepotError>;

    /// Insert a new parcel together with its first history row.
    ///
    /// A duplicate tracking code is reported as [`DepotError::Validation`].
    async fn create_package(
        &self,
        package: &Package,
        initial: &HistoryEntry,
    ) -> Result<(), DepotError>;

    /// Apply a status change and append its history row as one unit.
    ///
    /// Fails with [`DepotError::Conflict`] when the stored version no longer
    /// matches `change.expected_version`; nothing is written in that case.
    async fn update_package_status(
        &self,
        change: &StatusChange,
        entry: &HistoryEntry,
    ) -> Result<Package, DepotError>;

    /// Append a standalone history row.
    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), DepotError>;

    /// History of a parcel, oldest first.
    async fn list_history(&self, package_id: &str) -> Result<Vec<HistoryEntry>, DepotError>;

    /// Live parcels past their retention deadline that a sweep may expire.
    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Package>, DepotError>;

    /// Expired parcels whose last status write is older than `cutoff`.
    async fn find_purgeable(&self, cutoff: DateTime<Utc>) -> Result<Vec<Package>, DepotError>;

    /// Number of live parcels owned by the user with this phone number.
    async fn count_by_owner_phone(&self, phone: &str) -> Result<u64, DepotError>;

    /// Live parcels owned by the user with this phone number, newest first.
    async fn list_by_owner_phone(&self, phone: &str) -> Result<Vec<Package>, DepotError>;

    /// Like [`list_by_owner_phone`](Self::list_by_owner_phone), restricted to
    /// parcels received in `[from, until)`.
    async fn list_by_owner_phone_between(
        &self,
        phone: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Package>, DepotError>;
}
