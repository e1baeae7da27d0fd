// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Depot parcel engine.
//!
//! This crate provides the domain types, the error taxonomy, and the adapter
//! traits that the store, the notification channel, and the lifecycle engine
//! agree on.

pub mod clock;
pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::DepotError;
pub use phone::normalize_phone;
pub use types::{
    AdapterType, ChatIntent, ConnectionState, CronLog, CronStatus, HealthStatus, HistoryEntry,
    Locker, NewPackage, Owner, Package, PackageStatus, PackageType, Recipient, Sender,
    StatusChange, StatusUpdate,
};

pub use traits::{
    CronLogSink, DirectoryStore, IntentExtractor, NotificationChannel, PackageStore,
    PluginAdapter, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn package_status_round_trips_through_strings() {
        for status in PackageStatus::iter() {
            let s = status.to_string();
            assert_eq!(PackageStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(PackageStatus::Processing.to_string(), "processing");
        assert_eq!(
            PackageStatus::from_str("COMPLETED").unwrap(),
            PackageStatus::Completed
        );
        assert!(PackageStatus::from_str("lost").is_err());
    }

    #[test]
    fn only_expired_and_deleted_are_system_only() {
        let system: Vec<_> = PackageStatus::iter().filter(|s| s.is_system_only()).collect();
        assert_eq!(system, vec![PackageStatus::Expired, PackageStatus::Deleted]);
        assert!(PackageStatus::Completed.is_terminal());
        assert!(!PackageStatus::Delivered.is_terminal());
    }

    #[test]
    fn package_type_parses_snake_case() {
        assert_eq!(PackageType::from_str("document").unwrap(), PackageType::Document);
        assert_eq!(PackageType::Item.to_string(), "item");
        assert!(PackageType::from_str("crate").is_err());
    }

    #[test]
    fn error_messages_are_user_facing() {
        let illegal = DepotError::IllegalTransition {
            from: "received".into(),
            to: "completed".into(),
        };
        assert_eq!(
            illegal.to_string(),
            "cannot move from received to completed directly"
        );
        assert!(illegal.is_policy_rejection());
        assert!(!illegal.is_retryable());

        let missing = DepotError::not_found("package", "p-1");
        assert_eq!(missing.to_string(), "package p-1 not found");

        let conflict = DepotError::Conflict {
            package_id: "p-1".into(),
        };
        assert!(conflict.is_retryable());
        assert!(conflict.to_string().contains("please retry"));
    }

    #[test]
    fn chat_intent_serializes_with_tag() {
        let intent = ChatIntent::CheckPackage {
            tracking_code: Some("PACK1".into()),
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["intent"], "check_package");
        assert_eq!(json["tracking_code"], "PACK1");

        let parsed: ChatIntent = serde_json::from_str(r#"{"intent":"greeting"}"#).unwrap();
        assert_eq!(parsed, ChatIntent::Greeting);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_package_store<T: PackageStore>() {}
        fn _assert_directory_store<T: DirectoryStore>() {}
        fn _assert_channel<T: NotificationChannel>() {}
        fn _assert_cron_sink<T: CronLogSink>() {}
        fn _assert_intent<T: IntentExtractor>() {}
    }
}
