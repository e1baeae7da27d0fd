// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::DepotError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DepotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DepotError>;
}
