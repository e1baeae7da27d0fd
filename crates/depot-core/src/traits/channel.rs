// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification channel (WhatsApp, etc.).

use async_trait::async_trait;

use crate::error::DepotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ConnectionState;

/// Delivers plain text to an opaque destination address.
///
/// Implementations own their session state. The engine decides when to
/// retry; it calls [`connect`](Self::connect) to re-establish a session
/// after a failed send.
#[async_trait]
pub trait NotificationChannel: PluginAdapter {
    /// Establishes (or re-establishes) the channel session.
    async fn connect(&self) -> Result<(), DepotError>;

    /// Sends `text` to `destination`. No delivery receipt is implied.
    async fn send(&self, destination: &str, text: &str) -> Result<(), DepotError>;

    /// Current session state.
    fn connection_state(&self) -> ConnectionState;
}
