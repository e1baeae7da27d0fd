// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as known status names, positive windows, and parseable cron expressions.

use std::str::FromStr;

use depot_core::PackageStatus;

use crate::diagnostic::ConfigError;
use crate::model::DepotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DepotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let lifecycle = &config.lifecycle;
    if lifecycle.retention_days == 0 {
        errors.push(ConfigError::Validation {
            message: "lifecycle.retention_days must be at least 1".to_string(),
        });
    }
    if lifecycle.grace_days == 0 {
        errors.push(ConfigError::Validation {
            message: "lifecycle.grace_days must be at least 1".to_string(),
        });
    }
    if !(-12..=14).contains(&lifecycle.utc_offset_hours) {
        errors.push(ConfigError::Validation {
            message: format!(
                "lifecycle.utc_offset_hours must be between -12 and 14, got {}",
                lifecycle.utc_offset_hours
            ),
        });
    }
    if lifecycle.tracking_prefix.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "lifecycle.tracking_prefix must not be empty".to_string(),
        });
    }

    for (from, successors) in &lifecycle.transition_table() {
        match PackageStatus::from_str(from) {
            Ok(status) if status.is_system_only() => errors.push(ConfigError::Validation {
                message: format!("lifecycle.transitions: `{from}` is managed by the sweeps"),
            }),
            Ok(_) => {}
            Err(_) => errors.push(ConfigError::Validation {
                message: format!("lifecycle.transitions: unknown status `{from}`"),
            }),
        }
        for to in successors {
            match PackageStatus::from_str(to) {
                Ok(status) if status.is_system_only() => errors.push(ConfigError::Validation {
                    message: format!(
                        "lifecycle.transitions.{from}: `{to}` can only be reached by a sweep"
                    ),
                }),
                Ok(PackageStatus::Received) => errors.push(ConfigError::Validation {
                    message: format!(
                        "lifecycle.transitions.{from}: `received` is the initial status"
                    ),
                }),
                Ok(_) => {}
                Err(_) => errors.push(ConfigError::Validation {
                    message: format!("lifecycle.transitions.{from}: unknown status `{to}`"),
                }),
            }
        }
    }

    if config.notification.send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "notification.send_timeout_secs must be at least 1".to_string(),
        });
    }

    for (key, expr) in [
        ("sweep.expire_schedule", &config.sweep.expire_schedule),
        ("sweep.purge_schedule", &config.sweep.purge_schedule),
    ] {
        if let Err(e) = expr.parse::<croner::Cron>() {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{expr}` is not a valid cron expression: {e}"),
            });
        }
    }

    if config.sweep.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sweep.timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
