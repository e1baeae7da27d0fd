// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort delivery of owner notifications.
//!
//! [`Notifier`] owns the retry policy around a [`NotificationChannel`]: on a
//! failed send it asks the channel to reconnect, waits a fixed backoff, and
//! retries exactly once. Failures are logged and reported as an outcome,
//! never as an error.

use std::sync::Arc;
use std::time::Duration;

use depot_config::model::NotificationConfig;
use depot_core::{DepotError, DirectoryStore, NotificationChannel, Package};
use tracing::{debug, info, warn};

use crate::compose::{Composer, NotificationEvent, Parties};
use depot_core::normalize_phone;

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { attempts: u32 },
    /// Both attempts failed.
    Failed,
    /// Notifications are disabled or there was no usable destination.
    Skipped,
}

pub struct Notifier {
    channel: Option<Arc<dyn NotificationChannel>>,
    backoff: Duration,
    send_timeout: Duration,
}

impl Notifier {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        backoff: Duration,
        send_timeout: Duration,
    ) -> Self {
        Self {
            channel: Some(channel),
            backoff,
            send_timeout,
        }
    }

    /// A notifier that skips every dispatch.
    pub fn disabled() -> Self {
        Self {
            channel: None,
            backoff: Duration::ZERO,
            send_timeout: Duration::ZERO,
        }
    }

    pub fn from_config(
        channel: Option<Arc<dyn NotificationChannel>>,
        config: &NotificationConfig,
    ) -> Self {
        match channel {
            Some(channel) if config.enabled => Self::new(
                channel,
                Duration::from_millis(config.retry_backoff_ms),
                Duration::from_secs(config.send_timeout_secs),
            ),
            _ => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Send `text`, reconnecting and retrying once on failure.
    pub async fn dispatch(&self, destination: &str, text: &str) -> DispatchOutcome {
        let Some(channel) = &self.channel else {
            return DispatchOutcome::Skipped;
        };

        let first = match self.attempt(channel.as_ref(), destination, text).await {
            Ok(()) => return DispatchOutcome::Delivered { attempts: 1 },
            Err(e) => e,
        };
        warn!(destination, attempt = 1, error = %first, "notification send failed, reconnecting");

        if let Err(e) = channel.connect().await {
            warn!(error = %e, "channel reconnect failed");
        }
        tokio::time::sleep(self.backoff).await;

        match self.attempt(channel.as_ref(), destination, text).await {
            Ok(()) => {
                info!(destination, attempt = 2, "notification delivered on retry");
                DispatchOutcome::Delivered { attempts: 2 }
            }
            Err(e) => {
                let err = DepotError::NotificationDelivery {
                    message: format!("giving up on {destination} after retry"),
                    source: Some(Box::new(e)),
                };
                warn!(destination, attempt = 2, error = %err, "notification dropped");
                DispatchOutcome::Failed
            }
        }
    }

    async fn attempt(
        &self,
        channel: &dyn NotificationChannel,
        destination: &str,
        text: &str,
    ) -> Result<(), DepotError> {
        match tokio::time::timeout(self.send_timeout, channel.send(destination, text)).await {
            Ok(result) => result,
            Err(_) => Err(DepotError::Timeout {
                duration: self.send_timeout,
            }),
        }
    }
}

/// Resolves the people a parcel refers to, renders the message, and
/// dispatches it to the owner.
pub struct PackageNotifier {
    directory: Arc<dyn DirectoryStore>,
    composer: Composer,
    notifier: Notifier,
}

impl PackageNotifier {
    pub fn new(directory: Arc<dyn DirectoryStore>, composer: Composer, notifier: Notifier) -> Self {
        Self {
            directory,
            composer,
            notifier,
        }
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Never fails: lookup and delivery problems are logged and skipped.
    pub async fn notify(&self, event: NotificationEvent, pkg: &Package) -> DispatchOutcome {
        if !self.notifier.is_enabled() {
            return DispatchOutcome::Skipped;
        }

        let owner = match self.directory.get_owner(&pkg.owner_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                warn!(package_id = %pkg.id, owner_id = %pkg.owner_id, "owner missing, notification skipped");
                return DispatchOutcome::Skipped;
            }
            Err(e) => {
                warn!(package_id = %pkg.id, error = %e, "owner lookup failed, notification skipped");
                return DispatchOutcome::Skipped;
            }
        };
        let Some(destination) = normalize_phone(&owner.phone_number) else {
            warn!(package_id = %pkg.id, owner_id = %owner.id, "owner has no usable phone number");
            return DispatchOutcome::Skipped;
        };

        let mut parties = Parties {
            owner_name: owner.name,
            ..Parties::default()
        };
        match event {
            NotificationEvent::Received => {
                parties.sender_name = self.sender_name(pkg).await;
            }
            NotificationEvent::Completed => {
                parties.recipient_name = self.recipient_name(pkg).await;
            }
            NotificationEvent::Expired => {}
        }

        let text = self.composer.compose(event, pkg, &parties);
        let outcome = self.notifier.dispatch(&destination, &text).await;
        debug!(package_id = %pkg.id, %event, ?outcome, "notification dispatched");
        outcome
    }

    async fn sender_name(&self, pkg: &Package) -> Option<String> {
        match self.directory.get_sender(&pkg.sender_id).await {
            Ok(sender) => sender.map(|s| s.name),
            Err(e) => {
                warn!(package_id = %pkg.id, error = %e, "sender lookup failed");
                None
            }
        }
    }

    async fn recipient_name(&self, pkg: &Package) -> Option<String> {
        let id = pkg.picked_up_by.as_deref()?;
        match self.directory.get_recipient(id).await {
            Ok(recipient) => recipient.map(|r| r.name),
            Err(e) => {
                warn!(package_id = %pkg.id, error = %e, "recipient lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_test_utils::MockChannel;
    use tracing_test::traced_test;

    fn notifier(channel: Arc<MockChannel>) -> Notifier {
        Notifier::new(channel, Duration::from_millis(5), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn first_attempt_success_does_not_reconnect() {
        let channel = Arc::new(MockChannel::new());
        let outcome = notifier(channel.clone()).dispatch("62811", "hi").await;

        assert_eq!(outcome, DispatchOutcome::Delivered { attempts: 1 });
        assert_eq!(channel.send_attempts(), 1);
        assert_eq!(channel.reconnect_count(), 0);
        assert_eq!(channel.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn one_failure_reconnects_and_retries_once() {
        let channel = Arc::new(MockChannel::new().fail_first(1));
        let outcome = notifier(channel.clone()).dispatch("62811", "hi").await;

        assert_eq!(outcome, DispatchOutcome::Delivered { attempts: 2 });
        assert_eq!(channel.send_attempts(), 2);
        assert_eq!(channel.reconnect_count(), 1);
        let sent = channel.sent_messages().await;
        assert_eq!(sent, vec![("62811".to_string(), "hi".to_string())]);
        assert!(logs_contain("notification delivered on retry"));
    }

    #[tokio::test]
    async fn persistent_failure_gives_up_after_second_attempt() {
        let channel = Arc::new(MockChannel::new().always_fail());
        let outcome = notifier(channel.clone()).dispatch("62811", "hi").await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(channel.send_attempts(), 2);
        assert_eq!(channel.reconnect_count(), 1);
        assert!(channel.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn slow_send_counts_as_failure() {
        let channel = Arc::new(MockChannel::new().with_delay(Duration::from_secs(5)));
        let notifier = Notifier::new(
            channel.clone(),
            Duration::from_millis(1),
            Duration::from_millis(20),
        );
        assert_eq!(notifier.dispatch("62811", "hi").await, DispatchOutcome::Failed);
        assert_eq!(channel.send_attempts(), 2);
    }

    #[tokio::test]
    async fn disabled_notifier_skips() {
        assert_eq!(
            Notifier::disabled().dispatch("62811", "hi").await,
            DispatchOutcome::Skipped
        );
        let config = NotificationConfig {
            enabled: false,
            ..NotificationConfig::default()
        };
        let channel: Arc<dyn NotificationChannel> = Arc::new(MockChannel::new());
        assert!(!Notifier::from_config(Some(channel), &config).is_enabled());
    }
}
