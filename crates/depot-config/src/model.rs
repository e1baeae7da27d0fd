// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Depot parcel engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Depot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DepotConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Parcel lifecycle rules.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Notification retry policy.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// WhatsApp Cloud API credentials.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Sweep schedules.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name reported in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "depot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("depot").join("depot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("depot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Parcel lifecycle configuration.
///
/// `transitions` maps each status to the statuses a caller may move it to.
/// When set it replaces the built-in graph entirely. `expired` and `deleted`
/// are reached only by the sweeps and may not appear as successors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Days an uncollected parcel is kept before the expire sweep picks it up.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Days an expired parcel is kept before the purge sweep soft-deletes it.
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,

    /// Offset of the office's local time from UTC, used for "today" and message dates.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Office name used in notifications.
    #[serde(default = "default_office_name")]
    pub office_name: String,

    /// Prefix for generated tracking codes.
    #[serde(default = "default_tracking_prefix")]
    pub tracking_prefix: String,

    /// Legal caller-driven successors of each status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<BTreeMap<String, Vec<String>>>,
}

impl LifecycleConfig {
    /// The configured transition table, or the built-in one.
    pub fn transition_table(&self) -> BTreeMap<String, Vec<String>> {
        self.transitions.clone().unwrap_or_else(default_transitions)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            grace_days: default_grace_days(),
            utc_offset_hours: default_utc_offset_hours(),
            office_name: default_office_name(),
            tracking_prefix: default_tracking_prefix(),
            transitions: None,
        }
    }
}

fn default_retention_days() -> u32 {
    90
}

fn default_grace_days() -> u32 {
    14
}

fn default_utc_offset_hours() -> i32 {
    7
}

fn default_office_name() -> String {
    "the Depot mailroom".to_string()
}

fn default_tracking_prefix() -> String {
    "PACK".to_string()
}

/// Received -> {Processing, Delivered}, Processing -> Delivered, Delivered -> Completed.
pub fn default_transitions() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "received".to_string(),
            vec!["processing".to_string(), "delivered".to_string()],
        ),
        ("processing".to_string(), vec!["delivered".to_string()]),
        ("delivered".to_string(), vec!["completed".to_string()]),
    ])
}

/// Notification dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Send notifications at all. When false, dispatch is skipped.
    #[serde(default = "default_notification_enabled")]
    pub enabled: bool,

    /// Fixed wait between the failed send and its single retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on a single send attempt.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notification_enabled(),
            retry_backoff_ms: default_retry_backoff_ms(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_notification_enabled() -> bool {
    true
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API base URL including version.
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,

    /// Business phone number ID messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Permanent or system-user access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_whatsapp_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: default_whatsapp_api_base(),
            phone_number_id: None,
            access_token: None,
            request_timeout_secs: default_whatsapp_request_timeout_secs(),
        }
    }
}

impl WhatsAppConfig {
    /// Both credentials are present.
    pub fn is_configured(&self) -> bool {
        self.phone_number_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.access_token.as_deref().is_some_and(|s| !s.is_empty())
    }
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

fn default_whatsapp_request_timeout_secs() -> u64 {
    15
}

/// Sweep scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Run the sweeps from `depot serve`.
    #[serde(default = "default_sweep_enabled")]
    pub enabled: bool,

    /// Cron expression for the expire sweep, in office local time.
    #[serde(default = "default_expire_schedule")]
    pub expire_schedule: String,

    /// Cron expression for the purge sweep, in office local time.
    #[serde(default = "default_purge_schedule")]
    pub purge_schedule: String,

    /// Overall deadline for one sweep run.
    #[serde(default = "default_sweep_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweep_enabled(),
            expire_schedule: default_expire_schedule(),
            purge_schedule: default_purge_schedule(),
            timeout_secs: default_sweep_timeout_secs(),
        }
    }
}

fn default_sweep_enabled() -> bool {
    true
}

fn default_expire_schedule() -> String {
    "0 0 * * *".to_string()
}

fn default_purge_schedule() -> String {
    "30 0 * * *".to_string()
}

fn default_sweep_timeout_secs() -> u64 {
    600
}
