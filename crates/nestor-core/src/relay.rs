//! Relay delivery contract.
//!
//! In production mode a [`Response`](crate::Response) hands its strings to a
//! [`Relay`], which forwards them to the remote chat-relay API. The core only
//! defines the contract; the HTTP implementation lives in `nestor-transport`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeliveryResult;

/// Relay host used when none is configured.
pub const DEFAULT_API_HOST: &str = "https://v2.asknestor.me";

/// One outbound delivery, as posted to `<host>/teams/<team_id>/messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Tenant the robot belongs to.
    pub team_id: String,
    /// Destination user.
    pub user_uid: String,
    /// Destination room.
    pub channel_uid: String,
    /// Strings to deliver, in order.
    pub strings: Vec<String>,
    /// Whether the transport should mention `user_uid`.
    pub reply: bool,
}

impl OutboundMessage {
    /// Relay path for this message's team.
    pub fn path(&self) -> String {
        format!("/teams/{}/messages", self.team_id)
    }
}

/// Delivers outbound messages to the remote relay.
///
/// Implementations must not retry and must report every failure through the
/// returned [`DeliveryResult`].
#[async_trait]
pub trait Relay: Send + Sync {
    /// Posts one message, succeeding only on `202 Accepted`.
    async fn deliver(&self, message: &OutboundMessage) -> DeliveryResult;
}

/// Relay connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay base URL.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Value of the `Authorization` header.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RelayConfig {
    /// Creates a config for `api_host` authorized with `auth_token`.
    pub fn new(api_host: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            auth_token: Some(auth_token.into()),
            ..Default::default()
        }
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full relay URL for `message`.
    pub fn messages_url(&self, message: &OutboundMessage) -> String {
        format!("{}{}", self.api_host.trim_end_matches('/'), message.path())
    }
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}
