// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language intent extraction for inbound chat messages.

use async_trait::async_trait;

use crate::error::DepotError;
use crate::types::ChatIntent;

/// Turns free text into a [`ChatIntent`].
#[async_trait]
pub trait IntentExtractor: Send + Sync + 'static {
    async fn extract(&self, text: &str) -> Result<ChatIntent, DepotError>;
}
