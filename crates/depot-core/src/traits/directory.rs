// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to the people and places a parcel refers to.

use async_trait::async_trait;

use crate::error::DepotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Locker, Owner, Recipient, Sender};

/// Directory records are maintained elsewhere; the engine only reads them.
#[async_trait]
pub trait DirectoryStore: PluginAdapter {
    async fn get_owner(&self, id: &str) -> Result<Option<Owner>, DepotError>;

    async fn find_owner_by_phone(&self, phone: &str) -> Result<Option<Owner>, DepotError>;

    async fn get_sender(&self, id: &str) -> Result<Option<Sender>, DepotError>;

    async fn get_locker(&self, id: &str) -> Result<Option<Locker>, DepotError>;

    async fn get_recipient(&self, id: &str) -> Result<Option<Recipient>, DepotError>;
}
