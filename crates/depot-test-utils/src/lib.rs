// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Depot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Notification channel with scripted failures and captured sends
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Full lifecycle stack over a temp SQLite database

pub mod clock;
pub mod harness;
pub mod mock_channel;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_channel::MockChannel;
