// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel adapter for the Depot parcel engine.
//!
//! Sends owner notifications as plain text messages through the WhatsApp
//! Cloud API. The adapter owns its session state; the lifecycle engine
//! only asks it to `connect()` again after a failed send.

pub mod channel;
mod types;

pub use channel::WhatsAppChannel;
