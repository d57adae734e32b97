//! # Nestor Transport
//!
//! HTTP implementations for the Nestor bot runtime.
//!
//! | Type | Role |
//! |------|------|
//! | [`RelayClient`] | Production [`Relay`](nestor_core::Relay): posts responses to the chat relay |
//! | [`ScopedClient`] | Outbound HTTP for listener code, via [`RobotHttpExt::http`] |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Listener code      │  robot.http(..), res.send(..)
//! ├─────────────────────┤
//! │  nestor-core        │  Relay trait, HttpOptions
//! ├─────────────────────┤
//! │  nestor-transport   │  <- This crate (reqwest)
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```

pub mod error;
pub mod relay;
pub mod scoped;

pub use error::{TransportError, TransportResult};
pub use relay::RelayClient;
pub use scoped::{HttpResponse, RobotHttpExt, ScopedClient};
