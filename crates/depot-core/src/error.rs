// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Depot parcel engine.

use thiserror::Error;

/// The primary error type used across all Depot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DepotError {
    /// Malformed or missing input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist. Never retried.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The requested status is not a member of the status enumeration.
    #[error("invalid status `{0}`")]
    InvalidStatus(String),

    /// The requested status can only be reached by a sweep.
    #[error("status {0} cannot be set manually")]
    ForbiddenManualTransition(String),

    /// The requested status is not a legal successor of the current one.
    #[error("cannot move from {from} to {to} directly")]
    IllegalTransition { from: String, to: String },

    /// Another writer changed the parcel first. The caller may retry.
    #[error("conflicting update on package {package_id}, please retry")]
    Conflict { package_id: String },

    /// A notification could not be delivered after the retry.
    #[error("notification delivery failed: {message}")]
    NotificationDelivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, rejected request).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, unknown status names, bad schedules).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DepotError {
    /// Shorthand for a [`DepotError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DepotError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Only a lost optimistic-concurrency race is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DepotError::Conflict { .. })
    }

    /// True for rejections produced by the status policy.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            DepotError::InvalidStatus(_)
                | DepotError::ForbiddenManualTransition(_)
                | DepotError::IllegalTransition { .. }
        )
    }
}
