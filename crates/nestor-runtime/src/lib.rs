//! Nestor Runtime - orchestration layer for the Nestor bot runtime.
//!
//! This crate provides:
//! - Layered configuration (`NestorConfig`, `ConfigLoader`)
//! - Logging setup on top of `tracing-subscriber`
//! - Compiled-in scripts (`script!`, `ScriptRegistry`)
//! - The runtime loop (`NestorRuntime`)
//!
//! ```ignore
//! use nestor_runtime::{ConfigLoader, NestorRuntime, logging};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = NestorRuntime::from_loader(ConfigLoader::new())?;
//!     logging::init_from_config(&runtime.config().logging);
//!     runtime.load_scripts()?;
//!
//!     let (tx, rx) = mpsc::channel(64);
//!     // hand `tx` to whatever reads inbound chat messages
//!     runtime.run(rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod script;

pub use config::{ConfigLoader, NestorConfig, load_config, load_config_from_file};
pub use error::{RuntimeError, RuntimeResult, ScriptError, ScriptResult};
pub use runtime::NestorRuntime;
pub use script::{RegisterFn, SCRIPTS, ScriptDescriptor, ScriptRegistry};

// Used by `script!` expansions.
#[doc(hidden)]
pub use linkme;
