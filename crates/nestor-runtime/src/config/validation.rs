//! Configuration validation.
//!
//! Checks run after loading, before a runtime is built. Production mode needs
//! everything the relay requires; debug mode only needs a bot identity.

use tracing::debug;

use super::error::{ConfigError, ConfigResult};
use super::schema::NestorConfig;

/// Validates a loaded configuration.
pub fn validate_config(config: &NestorConfig) -> ConfigResult<()> {
    if config.robot.bot_id.trim().is_empty() {
        return Err(ConfigError::missing_field("robot.bot_id"));
    }

    if let Some(agent) = &config.http.agent {
        validate_url(agent)?;
    }

    if config.robot.debug_mode {
        debug!("Debug mode enabled, skipping relay validation");
        return Ok(());
    }

    if config.robot.team_id.trim().is_empty() {
        return Err(ConfigError::missing_field("robot.team_id"));
    }

    match config.relay.auth_token.as_deref() {
        Some(token) if !token.is_empty() => {}
        _ => return Err(ConfigError::missing_field("relay.auth_token")),
    }

    validate_url(&config.relay.api_host)?;

    if config.relay.timeout_ms == 0 {
        return Err(ConfigError::validation("relay.timeout_ms must be positive"));
    }

    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ConfigError::invalid_url(url, "missing scheme"));
    };
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::invalid_url(url, "scheme must be http or https"));
    }
    if rest.is_empty() {
        return Err(ConfigError::invalid_url(url, "missing host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production() -> NestorConfig {
        let mut config = NestorConfig::default();
        config.robot.team_id = "T1".into();
        config.relay.auth_token = Some("token".into());
        config
    }

    #[test]
    fn test_debug_mode_needs_only_bot_id() {
        let mut config = NestorConfig::default();
        config.robot.debug_mode = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_production_is_valid() {
        assert!(validate_config(&production()).is_ok());
    }

    #[test]
    fn test_production_requires_token() {
        let mut config = production();
        config.relay.auth_token = None;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "relay.auth_token"
        ));
    }

    #[test]
    fn test_production_requires_team() {
        let mut config = production();
        config.robot.team_id.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_api_host() {
        let mut config = production();
        config.relay.api_host = "ftp://relay".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        config.relay.api_host = "relay.example.com".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_agent() {
        let mut config = production();
        config.http.agent = Some("proxy:3128".into());
        assert!(validate_config(&config).is_err());
    }
}
