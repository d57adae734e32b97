//! # Nestor Core
//!
//! The message-routing core of the Nestor bot runtime.
//!
//! This crate accepts inbound chat messages, matches them against registered
//! pattern listeners, runs the first match and delivers the resulting text.
//! It contains no network code: production delivery goes through the
//! [`Relay`] trait, implemented in `nestor-transport`.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐     ┌─────────────────┐     ┌──────────┐     ┌──────────────┐
//! │ Transport │────▶│ Robot::receive  │────▶│ Listener │────▶│   Response   │
//! └───────────┘     │ (first match)   │     │ callback │     │ send / reply │
//!                   └─────────────────┘     └──────────┘     └──────┬───────┘
//!                                                                   │
//!                                         debug buffers ◀───────────┤
//!                                         Relay (HTTP)  ◀───────────┘
//! ```
//!
//! ## Listeners
//!
//! - [`Robot::hear`] matches the raw message text.
//! - [`Robot::respond`] matches only text addressed to the bot, using
//!   [`respond_pattern`] to rewrite the pattern.
//!
//! Every callback receives a [`Response`] and a [`Done`] handle; the receive
//! cycle resolves when `Done` is completed.

pub mod error;
pub mod http;
pub mod listener;
pub mod message;
pub mod pattern;
pub mod relay;
pub mod response;
pub mod robot;

pub use error::{DeliveryError, DeliveryResult, RegisterError, RegisterResult};
pub use http::{DEFAULT_USER_AGENT, HttpOptions, ResolvedHttpOptions};
pub use listener::{Callback, Captures, Done, Listener};
pub use message::{Message, User};
pub use pattern::respond_pattern;
pub use relay::{DEFAULT_API_HOST, OutboundMessage, Relay, RelayConfig};
pub use response::Response;
pub use robot::{ReceiveOutcome, Robot, RobotBuilder};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{Done, Message, ReceiveOutcome, Response, Robot, User};
}
