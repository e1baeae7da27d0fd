// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the lifecycle engine, and the adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Channel,
    IntentExtractor,
}

/// Lifecycle status of a parcel.
///
/// `Received` is initial. `Completed` is the caller-reachable terminal state.
/// `Expired` and `Deleted` are only ever set by the sweeps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Received,
    Processing,
    Delivered,
    Completed,
    Expired,
    Deleted,
}

impl PackageStatus {
    /// Statuses that no caller may request.
    pub fn is_system_only(self) -> bool {
        matches!(self, PackageStatus::Expired | PackageStatus::Deleted)
    }

    /// Statuses with no further caller-driven successor.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PackageStatus::Completed | PackageStatus::Expired | PackageStatus::Deleted
        )
    }
}

/// What kind of item a parcel is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Document,
    Item,
    Other,
}

/// A tracked parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub tracking_code: String,
    pub description: String,
    pub package_type: PackageType,
    pub quantity: i64,
    pub photo: Option<String>,
    pub status: PackageStatus,
    /// The user the parcel belongs to.
    pub owner_id: String,
    pub sender_id: String,
    pub locker_id: String,
    /// Recipient who physically collected the parcel, when not the owner.
    pub picked_up_by: Option<String>,
    pub proof_image: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expired_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token, bumped on every status write.
    pub version: i64,
}

/// Caller-supplied details for a parcel that just arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPackage {
    /// Generated when absent.
    pub tracking_code: Option<String>,
    pub description: String,
    /// Raw type name, validated against [`PackageType`].
    pub package_type: String,
    pub quantity: i64,
    pub photo: Option<String>,
    pub owner_id: String,
    pub sender_id: String,
    pub locker_id: String,
}

/// Extra fields accompanying a caller-driven status update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub picked_up_by: Option<String>,
    pub proof_image: Option<String>,
}

/// A status write guarded by the version the writer last observed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub package_id: String,
    pub expected_version: i64,
    pub status: PackageStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub picked_up_by: Option<String>,
    pub proof_image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusChange {
    /// Start a change from the current state of `pkg`, carrying its other lifecycle fields over.
    pub fn from_package(pkg: &Package, status: PackageStatus, at: DateTime<Utc>) -> Self {
        Self {
            package_id: pkg.id.clone(),
            expected_version: pkg.version,
            status,
            completed_at: pkg.completed_at,
            deleted_at: pkg.deleted_at,
            picked_up_by: pkg.picked_up_by.clone(),
            proof_image: pkg.proof_image.clone(),
            updated_at: at,
        }
    }
}

/// One immutable audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub package_id: String,
    /// The status the parcel moved to.
    pub status: PackageStatus,
    pub description: String,
    /// `None` for sweep-driven transitions.
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome recorded for one sweep execution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CronStatus {
    Success,
    Failure,
    Timeout,
    /// The previous run of the same job was still in flight.
    Skipped,
}

/// One row per sweep execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronLog {
    pub id: String,
    pub job_name: String,
    pub status: CronStatus,
    pub message: String,
    pub executed_at: DateTime<Utc>,
}

/// The user a parcel belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locker {
    pub id: String,
    pub code: String,
}

/// A person allowed to collect parcels on an owner's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
}

/// Session state of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Structured result of intent extraction for an inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ChatIntent {
    TotalAllPackage,
    ListPackageToday,
    ListPackageAll,
    CheckPackage { tracking_code: Option<String> },
    Greeting,
    Thanks,
    Unknown,
}
