//! HTTP relay client.
//!
//! Posts outbound messages to `<api_host>/teams/<team_id>/messages` as a
//! form-encoded `message` object:
//!
//! ```text
//! message[user_uid]=U123
//! message[channel_uid]=C456
//! message[strings]=["first","second"]
//! message[reply]=false
//! ```
//!
//! Only `202 Accepted` counts as delivered. Nothing is retried.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, info};

use nestor_core::{
    DEFAULT_USER_AGENT, DeliveryError, DeliveryResult, OutboundMessage, Relay, RelayConfig,
};

use crate::error::{TransportError, TransportResult};

/// Reqwest-backed [`Relay`].
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    config: RelayConfig,
    auth_token: String,
}

impl RelayClient {
    /// Creates a relay client.
    ///
    /// Fails if the config carries no auth token.
    pub fn new(config: RelayConfig) -> TransportResult<Self> {
        let auth_token = config
            .auth_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TransportError::invalid_config("relay auth token is not set"))?;

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| TransportError::invalid_config(e.to_string()))?;

        info!(api_host = %config.api_host, "Relay client ready");

        Ok(Self {
            client,
            config,
            auth_token,
        })
    }

    /// The relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("api_host", &self.config.api_host)
            .field("timeout_ms", &self.config.timeout_ms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Relay for RelayClient {
    async fn deliver(&self, message: &OutboundMessage) -> DeliveryResult {
        let url = self.config.messages_url(message);
        let strings = serde_json::to_string(&message.strings)
            .map_err(|e| DeliveryError::transport(e.to_string()))?;
        let reply = if message.reply { "true" } else { "false" };

        let form = [
            ("message[user_uid]", message.user_uid.as_str()),
            ("message[channel_uid]", message.channel_uid.as_str()),
            ("message[strings]", strings.as_str()),
            ("message[reply]", reply),
        ];

        debug!(url = %url, count = message.strings.len(), reply = message.reply, "Posting to relay");

        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.auth_token)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeliveryError::transport(e.to_string()))?;

        match resp.status() {
            StatusCode::ACCEPTED => Ok(()),
            status => Err(DeliveryError::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}
