//! Runtime error types.

use std::path::PathBuf;

use nestor_core::RegisterError;
use nestor_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while loading scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The named script file does not exist.
    #[error("script not found: {0}")]
    NotFound(PathBuf),

    /// The scripts directory could not be read.
    #[error("failed to read scripts from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for script loading.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Errors raised while starting or running the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
