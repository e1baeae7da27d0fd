// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod cron_log;
pub mod directory;
pub mod intent;
pub mod storage;
pub mod store;

pub use adapter::PluginAdapter;
pub use channel::NotificationChannel;
pub use cron_log::CronLogSink;
pub use directory::DirectoryStore;
pub use intent::IntentExtractor;
pub use storage::StorageAdapter;
pub use store::PackageStore;
