//! Options for the scoped HTTP client handed to listener code.
//!
//! Options come from three layers, lowest to highest precedence:
//!
//! 1. Built-in defaults ([`HttpOptions::builtin`])
//! 2. Robot-wide global options ([`Robot::global_http_options`])
//! 3. Call-site options passed to `robot.http(url, options)`
//!
//! Unset fields fall through to the layer below. Headers merge per name.
//!
//! [`Robot::global_http_options`]: crate::Robot::global_http_options

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `User-Agent` sent when no layer sets one.
pub const DEFAULT_USER_AGENT: &str = concat!("nestor-bot/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT_MS: u64 = 30000;

/// A partial set of HTTP client options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Connection agent: a proxy URL every request is routed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Overrides the default `User-Agent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl HttpOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in defaults layer.
    pub fn builtin() -> Self {
        Self {
            agent: None,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            headers: BTreeMap::new(),
        }
    }

    /// Sets the connection agent.
    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the `User-Agent`.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Layers `over` on top of `self`; fields set in `over` win.
    pub fn layer(mut self, over: &HttpOptions) -> Self {
        if over.agent.is_some() {
            self.agent.clone_from(&over.agent);
        }
        if over.timeout_ms.is_some() {
            self.timeout_ms = over.timeout_ms;
        }
        if over.user_agent.is_some() {
            self.user_agent.clone_from(&over.user_agent);
        }
        self.headers
            .extend(over.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Resolves the effective options for one client.
    pub fn resolve(call_site: Option<&HttpOptions>, global: &HttpOptions) -> ResolvedHttpOptions {
        let merged = match call_site {
            Some(call_site) => Self::builtin().layer(global).layer(call_site),
            None => Self::builtin().layer(global),
        };

        ResolvedHttpOptions {
            agent: merged.agent,
            timeout: Duration::from_millis(merged.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            user_agent: merged
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            headers: merged.headers,
        }
    }
}

/// Fully resolved HTTP client options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHttpOptions {
    /// Proxy URL, if any layer set one.
    pub agent: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Default request headers.
    pub headers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_site_agent_wins() {
        let global = HttpOptions::new().agent("http://global-proxy:3128");
        let call_site = HttpOptions::new().agent("http://call-site-proxy:3128");

        let resolved = HttpOptions::resolve(Some(&call_site), &global);
        assert_eq!(resolved.agent.as_deref(), Some("http://call-site-proxy:3128"));
    }

    #[test]
    fn test_global_agent_used_without_override() {
        let global = HttpOptions::new().agent("http://global-proxy:3128");

        let resolved = HttpOptions::resolve(Some(&HttpOptions::new()), &global);
        assert_eq!(resolved.agent.as_deref(), Some("http://global-proxy:3128"));

        let resolved = HttpOptions::resolve(None, &global);
        assert_eq!(resolved.agent.as_deref(), Some("http://global-proxy:3128"));
    }

    #[test]
    fn test_builtin_defaults_apply() {
        let resolved = HttpOptions::resolve(None, &HttpOptions::new());
        assert_eq!(resolved.agent, None);
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert_eq!(resolved.user_agent, DEFAULT_USER_AGENT);
        assert!(resolved.user_agent.starts_with("nestor-bot/"));
    }

    #[test]
    fn test_headers_merge_per_name() {
        let global = HttpOptions::new()
            .header("Accept", "application/json")
            .header("X-Team", "global");
        let call_site = HttpOptions::new().header("X-Team", "call-site");

        let resolved = HttpOptions::resolve(Some(&call_site), &global);
        assert_eq!(resolved.headers["Accept"], "application/json");
        assert_eq!(resolved.headers["X-Team"], "call-site");
    }

    #[test]
    fn test_timeout_layering() {
        let global = HttpOptions::new().timeout(Duration::from_secs(5));
        let resolved = HttpOptions::resolve(None, &global);
        assert_eq!(resolved.timeout, Duration::from_secs(5));

        let call_site = HttpOptions::new().timeout(Duration::from_millis(250));
        let resolved = HttpOptions::resolve(Some(&call_site), &global);
        assert_eq!(resolved.timeout, Duration::from_millis(250));
    }
}
