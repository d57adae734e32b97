//! # Nestor
//!
//! A listener-driven chat bot runtime.
//!
//! ## Overview
//!
//! Scripts register listeners on a [`Robot`](prelude::Robot). Each inbound
//! message is matched against them in registration order and the first match
//! gets a response object for replying into the conversation:
//!
//! ```text
//! ┌─────────┐     ┌───────────────────────┐     ┌──────────┐     ┌───────┐
//! │ Message │────▶│ Robot::receive        │────▶│ Listener │────▶│ Relay │
//! └─────────┘     │ first match wins      │     │ callback │     │ (202) │
//!                 └───────────────────────┘     └──────────┘     └───────┘
//! ```
//!
//! - **Core**: messages, listeners, dispatch, response delivery
//! - **Transport**: relay client and scoped HTTP client (reqwest)
//! - **Runtime**: configuration, logging, scripts, the receive loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestor::prelude::*;
//!
//! fn ping(robot: &Robot) -> RegisterResult {
//!     robot.respond_async("ping", |res| async move {
//!         res.reply(["PONG"]).await.ok();
//!     })
//! }
//!
//! script!("ping", ping);
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = NestorRuntime::from_loader(ConfigLoader::new())?;
//!     runtime.load_scripts()?;
//!     let (_tx, rx) = tokio::sync::mpsc::channel(64);
//!     runtime.run(rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `nestor.toml` files (default)
//! - `json-log`: JSON log output

pub use nestor_core as core;
pub use nestor_runtime as runtime;
pub use nestor_transport as transport;

pub use nestor_runtime::script;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use nestor::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use nestor_runtime::{ConfigLoader, NestorConfig, NestorRuntime, ScriptRegistry};

    // Listener API
    pub use nestor_core::{
        Done, HttpOptions, Message, ReceiveOutcome, RegisterResult, Response, Robot, User,
    };

    // Delivery results
    pub use nestor_core::{DeliveryError, DeliveryResult};

    // `robot.http(..)`
    pub use nestor_transport::RobotHttpExt;

    pub use crate::script;
}
