//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic base configuration ([`ConfigLoader::merge`])
//! 3. Profile-specific config file (`nestor.{profile}.toml`)
//! 4. Main config file (`nestor.toml`)
//! 5. Environment variables (`__NESTOR_*`)
//!
//! # Environment Variable Mapping
//!
//! The relay and robot settings keep their historical flat names:
//!
//! - `__NESTOR_AUTH_TOKEN=xxx` → `relay.auth_token`
//! - `__NESTOR_API_HOST=https://...` → `relay.api_host`
//! - `__NESTOR_TEAM_ID`, `__NESTOR_BOT_ID`, `__NESTOR_DEBUG_MODE` → `robot.*`
//!
//! Anything else nests on `__`:
//!
//! - `__NESTOR_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `__NESTOR_HTTP__AGENT=http://proxy:3128` → `http.agent`
//!
//! # Example
//!
//! ```rust,ignore
//! use nestor_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config/nestor.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::NestorConfig;

/// Prefix shared by all configuration environment variables.
pub const ENV_PREFIX: &str = "__NESTOR_";

#[cfg(feature = "toml-config")]
const BASE_NAMES: &[&str] = &["nestor.toml", "config.toml"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `__NESTOR_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(format!("{ENV_PREFIX}PROFILE"))
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a prefix-stripped environment key to its config path.
fn env_key_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    match key.as_str() {
        "auth_token" | "api_host" => format!("relay.{key}"),
        "team_id" | "bot_id" | "debug_mode" | "scripts_dir" => format!("robot.{key}"),
        _ => key.replace("__", "."),
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a programmatic base configuration.
    ///
    /// Files and environment variables still override it.
    pub fn merge(mut self, config: NestorConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<NestorConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: NestorConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            team_id = %config.robot.team_id,
            bot_id = %config.robot.bot_id,
            debug_mode = config.robot.debug_mode,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(NestorConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX).map(|key| env_key_path(key.as_str()).into()),
            );
        }

        Ok(figment)
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("nestor"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for base_name in BASE_NAMES {
                let stem = base_name.trim_end_matches(".toml");

                let profile_path = search_path.join(format!("{stem}.{}.toml", self.profile));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = figment.merge(Toml::file(&profile_path));
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(&base_path));
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        trace!(
            paths = self.resolve_search_paths().len(),
            "File configuration disabled"
        );
        figment
    }
}

/// Loads configuration from default locations.
pub fn load_config() -> ConfigResult<NestorConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<NestorConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use figment::Jail;
    use nestor_core::DEFAULT_API_HOST;

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(env_key_path("AUTH_TOKEN"), "relay.auth_token");
        assert_eq!(env_key_path("api_host"), "relay.api_host");
        assert_eq!(env_key_path("TEAM_ID"), "robot.team_id");
        assert_eq!(env_key_path("LOGGING__LEVEL"), "logging.level");
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.relay.api_host, DEFAULT_API_HOST);
            assert_eq!(config.relay.auth_token, None);
            assert_eq!(config.robot.bot_id, "nestor");
            assert!(!config.robot.debug_mode);
            assert_eq!(config.logging.level, LogLevel::Info);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("__NESTOR_AUTH_TOKEN", "secret");
            jail.set_env("__NESTOR_API_HOST", "http://localhost:9000");
            jail.set_env("__NESTOR_TEAM_ID", "T42");
            jail.set_env("__NESTOR_DEBUG_MODE", "true");
            jail.set_env("__NESTOR_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();

            assert_eq!(config.relay.auth_token.as_deref(), Some("secret"));
            assert_eq!(config.relay.api_host, "http://localhost:9000");
            assert_eq!(config.robot.team_id, "T42");
            assert!(config.robot.debug_mode);
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "nestor.toml",
                r#"
                [robot]
                team_id = "T-file"
                bot_id = "helper"

                [relay]
                auth_token = "from-file"

                [http]
                agent = "http://proxy:3128"
                "#,
            )?;
            jail.set_env("__NESTOR_AUTH_TOKEN", "from-env");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();

            assert_eq!(config.robot.team_id, "T-file");
            assert_eq!(config.robot.bot_id, "helper");
            assert_eq!(config.relay.auth_token.as_deref(), Some("from-env"));
            assert_eq!(config.http.agent.as_deref(), Some("http://proxy:3128"));
            Ok(())
        });
    }

    #[test]
    fn test_profile_file() {
        Jail::expect_with(|jail| {
            jail.create_file("nestor.production.toml", "[robot]\nteam_id = \"T-prod\"\n")?;
            jail.create_file("nestor.toml", "[robot]\nbot_id = \"helper\"\n")?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .profile("prod")
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.robot.team_id, "T-prod");
            assert_eq!(config.robot.bot_id, "helper");
            Ok(())
        });
    }

    #[test]
    fn test_programmatic_base_below_env() {
        Jail::expect_with(|jail| {
            jail.set_env("__NESTOR_BOT_ID", "from-env");

            let mut base = NestorConfig::default();
            base.robot.bot_id = "from-code".into();
            base.robot.team_id = "T-code".into();

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(base)
                .load()
                .unwrap();

            assert_eq!(config.robot.bot_id, "from-env");
            assert_eq!(config.robot.team_id, "T-code");
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/definitely/not/here/nestor.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
