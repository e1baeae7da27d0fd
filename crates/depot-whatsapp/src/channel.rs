// SPDX-FileCopyrightText: 2026 Depot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`WhatsAppChannel`] implements [`NotificationChannel`] over the Cloud API.
//!
//! Session state moves `Disconnected -> Connecting -> Connected` on
//! `connect()`, and drops back to `Disconnected` whenever a send fails or
//! the API rejects the credentials.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use depot_config::model::WhatsAppConfig;
use depot_core::traits::adapter::PluginAdapter;
use depot_core::traits::channel::NotificationChannel;
use depot_core::types::{AdapterType, ConnectionState, HealthStatus};
use depot_core::DepotError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::types::{ApiErrorResponse, TextMessageRequest};

pub struct WhatsAppChannel {
    client: reqwest::Client,
    api_base: String,
    phone_number_id: String,
    state: Mutex<ConnectionState>,
}

impl WhatsAppChannel {
    /// Build the channel from config. Both credentials must be present.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, DepotError> {
        let (Some(phone_number_id), Some(token)) = (
            config.phone_number_id.as_deref().filter(|s| !s.is_empty()),
            config.access_token.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(DepotError::Config(
                "whatsapp.phone_number_id and whatsapp.access_token are required".into(),
            ));
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                DepotError::Config(format!("invalid access token header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DepotError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.to_string(),
            state: Mutex::new(ConnectionState::Disconnected),
        })
    }

    fn set_state(&self, state: ConnectionState) {
        let mut current = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *current != state {
            debug!(from = %*current, to = %state, "whatsapp session state changed");
            *current = state;
        }
    }

    /// A disconnect reported from outside the send path, such as a failed
    /// health probe. The next send goes out after a fresh `connect()`.
    pub async fn handle_disconnect(&self) -> Result<(), DepotError> {
        warn!("whatsapp session lost, reconnecting");
        self.set_state(ConnectionState::Disconnected);
        self.connect().await
    }

    async fn rejection(response: reqwest::Response) -> DepotError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api) => match api.error.code {
                Some(code) => format!("WhatsApp API error {code} ({status}): {}", api.error.message),
                None => format!("WhatsApp API error ({status}): {}", api.error.message),
            },
            Err(_) => format!("WhatsApp API returned {status}: {body}"),
        };
        DepotError::Channel {
            message,
            source: None,
        }
    }

    fn transport_error(e: reqwest::Error) -> DepotError {
        DepotError::Channel {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DepotError> {
        Ok(match self.connection_state() {
            ConnectionState::Connected => HealthStatus::Healthy,
            ConnectionState::Connecting => HealthStatus::Degraded("connecting".into()),
            ConnectionState::Disconnected => HealthStatus::Degraded("disconnected".into()),
        })
    }

    async fn shutdown(&self) -> Result<(), DepotError> {
        self.set_state(ConnectionState::Disconnected);
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    /// Verify the credentials against the sender phone number resource.
    async fn connect(&self) -> Result<(), DepotError> {
        self.set_state(ConnectionState::Connecting);
        let url = format!("{}/{}", self.api_base, self.phone_number_id);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(Self::transport_error(e));
            }
        };
        if !response.status().is_success() {
            self.set_state(ConnectionState::Disconnected);
            return Err(Self::rejection(response).await);
        }

        self.set_state(ConnectionState::Connected);
        info!(phone_number_id = %self.phone_number_id, "whatsapp session connected");
        Ok(())
    }

    async fn send(&self, destination: &str, text: &str) -> Result<(), DepotError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let body = TextMessageRequest::new(destination, text);

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(Self::transport_error(e));
            }
        };
        let status = response.status();
        if !status.is_success() {
            self.set_state(ConnectionState::Disconnected);
            return Err(Self::rejection(response).await);
        }

        debug!(destination, %status, "whatsapp message accepted");
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
