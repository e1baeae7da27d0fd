// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification channel for deterministic testing.
//!
//! `MockChannel` implements `NotificationChannel` with scriptable failures
//! and captured outbound messages for assertion in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use depot_core::traits::adapter::PluginAdapter;
use depot_core::traits::channel::NotificationChannel;
use depot_core::types::{AdapterType, ConnectionState, HealthStatus};
use depot_core::DepotError;

/// A mock notification channel for testing.
///
/// - Every call to `send()` counts as an attempt, successful or not
/// - Successful sends are captured and retrievable via `sent_messages()`
/// - Every call to `connect()` counts as a reconnect
pub struct MockChannel {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    attempts: AtomicUsize,
    reconnects: AtomicUsize,
    failures_left: AtomicUsize,
    always_fail: bool,
    delay: Option<Duration>,
    state: std::sync::Mutex<ConnectionState>,
}

impl MockChannel {
    /// Create a mock channel that accepts every send.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: AtomicUsize::new(0),
            reconnects: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            always_fail: false,
            delay: None,
            state: std::sync::Mutex::new(ConnectionState::Connected),
        }
    }

    /// Fail the first `n` sends, then succeed.
    pub fn fail_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every send.
    pub fn always_fail(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Sleep this long inside every send before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all messages that were delivered, as `(destination, text)`.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    /// Get the count of delivered messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all delivered messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Number of `send()` calls, including failed ones.
    pub fn send_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of `connect()` calls.
    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn should_fail(&self) -> bool {
        if self.always_fail {
            return true;
        }
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DepotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DepotError> {
        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    async fn connect(&self) -> Result<(), DepotError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn send(&self, destination: &str, text: &str) -> Result<(), DepotError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail() {
            self.set_state(ConnectionState::Disconnected);
            return Err(DepotError::Channel {
                message: "mock send failure".into(),
                source: None,
            });
        }
        self.sent
            .lock()
            .await
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
