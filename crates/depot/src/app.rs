// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires the store, the notification channel, and the lifecycle engine
//! from configuration. Every subcommand starts here.

use std::sync::Arc;

use depot_config::model::DepotConfig;
use depot_core::{
    Clock, DepotError, DirectoryStore, NotificationChannel, PackageStore, PluginAdapter,
    StorageAdapter, SystemClock,
};
use depot_lifecycle::{
    ChatbotResponder, Composer, KeywordIntentExtractor, LifecycleService, Notifier,
    PackageLookup, PackageNotifier, SweepRunner, office_offset,
};
use depot_storage::SqliteStore;
use depot_whatsapp::WhatsAppChannel;
use tracing::{info, warn};

pub struct App {
    pub config: DepotConfig,
    pub store: Arc<SqliteStore>,
    pub channel: Option<Arc<WhatsAppChannel>>,
    pub clock: Arc<dyn Clock>,
    pub service: Arc<LifecycleService>,
    pub sweeps: Arc<SweepRunner>,
    pub chatbot: Arc<ChatbotResponder>,
}

impl App {
    pub async fn build(config: DepotConfig) -> Result<Self, DepotError> {
        let store = Arc::new(SqliteStore::new(config.storage.clone()));
        store.initialize().await?;

        let channel = build_channel(&config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let packages: Arc<dyn PackageStore> = store.clone();
        let directory: Arc<dyn DirectoryStore> = store.clone();

        let composer = Composer::new(
            config.lifecycle.office_name.clone(),
            config.lifecycle.utc_offset_hours,
        );
        let dyn_channel = channel
            .clone()
            .map(|c| c as Arc<dyn NotificationChannel>);
        let notifier = Arc::new(PackageNotifier::new(
            directory.clone(),
            composer.clone(),
            Notifier::from_config(dyn_channel, &config.notification),
        ));

        let service = Arc::new(LifecycleService::new(
            packages.clone(),
            directory.clone(),
            notifier.clone(),
            clock.clone(),
            &config.lifecycle,
        )?);
        let sweeps = Arc::new(SweepRunner::new(
            packages.clone(),
            notifier,
            clock.clone(),
            config.lifecycle.grace_days,
        ));
        let lookup = Arc::new(PackageLookup::new(
            packages,
            clock.clone(),
            office_offset(config.lifecycle.utc_offset_hours),
        ));
        let chatbot = Arc::new(ChatbotResponder::new(
            lookup,
            directory,
            Arc::new(KeywordIntentExtractor::new(&config.lifecycle.tracking_prefix)),
            composer,
        ));

        Ok(Self {
            config,
            store,
            channel,
            clock,
            service,
            sweeps,
            chatbot,
        })
    }

    /// Open the channel session if there is one. Failure is not fatal: the
    /// notifier reconnects on the first failed send.
    pub async fn connect_channel(&self) {
        let Some(channel) = &self.channel else {
            return;
        };
        match channel.connect().await {
            Ok(()) => info!("notification channel ready"),
            Err(e) => warn!(error = %e, "notification channel unavailable, will retry on send"),
        }
    }

    pub async fn close(&self) -> Result<(), DepotError> {
        if let Some(channel) = &self.channel {
            channel.shutdown().await?;
        }
        self.store.close().await
    }
}

fn build_channel(config: &DepotConfig) -> Result<Option<Arc<WhatsAppChannel>>, DepotError> {
    if !config.notification.enabled {
        info!("notifications disabled by configuration");
        return Ok(None);
    }
    if !config.whatsapp.is_configured() {
        warn!("whatsapp credentials missing, notifications will be skipped");
        return Ok(None);
    }
    Ok(Some(Arc::new(WhatsAppChannel::new(&config.whatsapp)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> DepotConfig {
        let mut config = DepotConfig::default();
        config.storage.database_path = dir.path().join("app.db").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn builds_without_channel_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::build(config(&dir)).await.unwrap();
        assert!(app.channel.is_none());
        assert_eq!(
            app.store.health_check().await.unwrap(),
            depot_core::HealthStatus::Healthy
        );
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn builds_whatsapp_channel_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.whatsapp.phone_number_id = Some("1055".into());
        config.whatsapp.access_token = Some("token".into());
        let app = App::build(config).await.unwrap();
        assert!(app.channel.is_some());

        let mut disabled = app.config.clone();
        disabled.notification.enabled = false;
        assert!(build_channel(&disabled).unwrap().is_none());
    }
}
