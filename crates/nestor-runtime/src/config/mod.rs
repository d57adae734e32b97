//! Configuration module for the Nestor runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for the robot identity, relay connection, HTTP defaults and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, NestorConfig, RobotConfig};
pub use validation::validate_config;
