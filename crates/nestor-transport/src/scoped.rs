//! Scoped HTTP client for listener code.
//!
//! A [`ScopedClient`] is bound to a base URL and a resolved option set. It
//! accumulates headers, path segments and query pairs through builder calls
//! and then issues a single request per verb call.
//!
//! ```rust,ignore
//! use nestor_transport::RobotHttpExt;
//!
//! robot.respond_async(r"weather (\w+)", |res| async move {
//!     let city = res.captures()[1].to_string();
//!     let Ok(client) = res.robot().http("https://api.example.com", None) else {
//!         return;
//!     };
//!     match client.path("weather").path(&city).get().await {
//!         Ok(body) => { res.send([body.text]).await.ok(); }
//!         Err(e) => { res.reply([format!("lookup failed: {e}")]).await.ok(); }
//!     }
//! })?;
//! ```

use std::collections::BTreeMap;

use reqwest::{Client, ClientBuilder, Method, Proxy};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use nestor_core::{HttpOptions, ResolvedHttpOptions, Robot};

use crate::error::{TransportError, TransportResult};

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub text: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> TransportResult<T> {
        serde_json::from_str(&self.text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// HTTP client scoped to one base URL.
#[derive(Debug, Clone)]
pub struct ScopedClient {
    client: Client,
    url: String,
    options: ResolvedHttpOptions,
    headers: BTreeMap<String, String>,
    query: Vec<(String, String)>,
}

impl ScopedClient {
    /// Creates a client for `url` from fully resolved options.
    pub fn new(url: impl Into<String>, options: ResolvedHttpOptions) -> TransportResult<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str());

        if let Some(agent) = &options.agent {
            let proxy = Proxy::all(agent.as_str())
                .map_err(|e| TransportError::invalid_config(format!("agent '{agent}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::invalid_config(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            headers: options.headers.clone(),
            options,
            query: Vec::new(),
        })
    }

    /// The options this client was built with.
    pub fn options(&self) -> &ResolvedHttpOptions {
        &self.options
    }

    /// The current request URL, without query.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sets a request header, replacing any previous value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets several request headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends a path segment.
    pub fn path(mut self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            self.url = format!("{}/{}", self.url.trim_end_matches('/'), segment);
        }
        self
    }

    /// Appends a query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Issues a GET request.
    pub async fn get(&self) -> TransportResult<HttpResponse> {
        self.request(Method::GET, None).await
    }

    /// Issues a DELETE request.
    pub async fn delete(&self) -> TransportResult<HttpResponse> {
        self.request(Method::DELETE, None).await
    }

    /// Issues a HEAD request.
    pub async fn head(&self) -> TransportResult<HttpResponse> {
        self.request(Method::HEAD, None).await
    }

    /// Issues a POST request with `body`.
    pub async fn post(&self, body: impl Into<String>) -> TransportResult<HttpResponse> {
        self.request(Method::POST, Some(body.into())).await
    }

    /// Issues a PUT request with `body`.
    pub async fn put(&self, body: impl Into<String>) -> TransportResult<HttpResponse> {
        self.request(Method::PUT, Some(body.into())).await
    }

    /// Issues a PATCH request with `body`.
    pub async fn patch(&self, body: impl Into<String>) -> TransportResult<HttpResponse> {
        self.request(Method::PATCH, Some(body.into())).await
    }

    async fn request(&self, method: Method, body: Option<String>) -> TransportResult<HttpResponse> {
        debug!(method = %method, url = %self.url, "Scoped HTTP request");

        let mut req = self.client.request(method, &self.url);
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !self.query.is_empty() {
            req = req.query(&self.query);
        }
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::request(&self.url, e))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::request(&self.url, e))?;

        trace!(status, bytes = text.len(), "Scoped HTTP response");
        Ok(HttpResponse { status, text })
    }
}

/// Adds `robot.http(url, options)` to [`Robot`].
pub trait RobotHttpExt {
    /// Creates a scoped client for `url`.
    ///
    /// Options merge as call-site > robot-wide global > built-in defaults.
    fn http(&self, url: &str, options: Option<HttpOptions>) -> TransportResult<ScopedClient>;
}

impl RobotHttpExt for Robot {
    fn http(&self, url: &str, options: Option<HttpOptions>) -> TransportResult<ScopedClient> {
        let resolved = HttpOptions::resolve(options.as_ref(), &self.global_http_options());
        ScopedClient::new(url, resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use nestor_core::DEFAULT_USER_AGENT;

    fn robot() -> Robot {
        Robot::new("T1", "nestor", true)
    }

    #[test]
    fn test_call_site_agent_overrides_global() {
        let robot = robot();
        robot.set_global_http_options(HttpOptions::new().agent("http://global:3128"));

        let client = robot
            .http(
                "http://example.com",
                Some(HttpOptions::new().agent("http://call-site:3128")),
            )
            .unwrap();
        assert_eq!(client.options().agent.as_deref(), Some("http://call-site:3128"));

        let client = robot.http("http://example.com", None).unwrap();
        assert_eq!(client.options().agent.as_deref(), Some("http://global:3128"));
    }

    #[test]
    fn test_builtin_defaults_without_options() {
        let client = robot().http("http://example.com", None).unwrap();
        assert_eq!(client.options().agent, None);
        assert_eq!(client.options().user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_agent_is_rejected() {
        let result = robot().http(
            "http://example.com",
            Some(HttpOptions::new().agent("not a url")),
        );
        assert!(matches!(result, Err(TransportError::InvalidConfig(_))));
    }

    #[test]
    fn test_path_joining() {
        let client = robot()
            .http("http://example.com/api/", None)
            .unwrap()
            .path("/v1/")
            .path("")
            .path("users");
        assert_eq!(client.url(), "http://example.com/api/v1/users");
    }

    #[tokio::test]
    async fn test_get_sends_default_user_agent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/nestor")
                    .query_param("page", "2")
                    .header("user-agent", DEFAULT_USER_AGENT)
                    .header("accept", "application/json");
                then.status(200).body(r#"{"stars":42}"#);
            })
            .await;

        let resp = robot()
            .http(&server.base_url(), None)
            .unwrap()
            .path("repos")
            .path("nestor")
            .query("page", "2")
            .header("Accept", "application/json")
            .get()
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(resp.is_success());
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body["stars"], 42);
    }

    #[tokio::test]
    async fn test_global_headers_and_post_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hooks")
                    .header("x-team", "T1")
                    .body("payload");
                then.status(201);
            })
            .await;

        let robot = robot();
        robot.set_global_http_options(HttpOptions::new().header("X-Team", "T1"));

        let resp = robot
            .http(&server.base_url(), None)
            .unwrap()
            .path("hooks")
            .post("payload")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.status, 201);
    }

    #[tokio::test]
    async fn test_non_success_is_not_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let resp = robot()
            .http(&server.base_url(), None)
            .unwrap()
            .path("missing")
            .get()
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
    }
}
