//! ActiveCampaign v1 client
//!
//! Composes the pieces of the HTTP stack for every call:
//! - Lazy, once-only token verification
//! - URL construction for the legacy `admin/api.php` endpoint
//! - Retry with exponential backoff around each attempt
//! - The shared rate limiter, entered once per attempt
//! - Response interpretation into JSON or a classified error

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::response::interpret;
use super::retry::RetryPolicy;
use super::session::Session;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, OptionStringExt, QueryParams};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Path of the legacy admin API, relative to the account URL
pub const V1_API_PATH: &str = "admin/api.php";

/// Configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Account API URL, e.g. `https://myaccount.api-us1.com`
    pub base_url: String,
    /// API token; checked at first use, not at construction
    pub api_token: Option<String>,
    /// Optional user agent header
    pub user_agent: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: RateLimiterConfig,
    /// Retry policy for verification and for each data request
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                base_url: base_url.into(),
                api_token: None,
                user_agent: None,
                timeout: DEFAULT_REQUEST_TIMEOUT,
                rate_limit: RateLimiterConfig::default(),
                retry: RetryPolicy::default(),
            },
        }
    }
}

/// Builder for client config
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    /// Set the user agent; empty strings are ignored
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into().none_if_empty();
        self
    }

    /// Set the request timeout; zero falls back to the default
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = if timeout.is_zero() {
            DEFAULT_REQUEST_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Set retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Options for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, appended after `api_action`/`api_output`
    pub query: QueryParams,
    /// Endpoint tag for request timing logs
    pub endpoint: Option<String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn params<K: Into<String>, V: ToString>(
        mut self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Tag the request with an endpoint name
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Client for the ActiveCampaign v1 API
///
/// One instance is shared by every stream in a sync run. It is `Send + Sync`;
/// share it behind an `Arc` to issue requests from several tasks. The session
/// is closed when the client is dropped.
#[derive(Debug)]
pub struct ActiveCampaignClient {
    session: Session,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl ActiveCampaignClient {
    /// Create a client. No network activity happens here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let session = Session::new(
            base_url,
            config.api_token,
            config.user_agent,
            config.timeout,
            config.retry,
        )?;

        Ok(Self {
            session,
            rate_limiter: RateLimiter::new(config.rate_limit),
            retry: config.retry,
        })
    }

    /// Create a client and verify the token immediately
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.verify().await?;
        Ok(client)
    }

    /// Verify the API token (at most one successful network check)
    pub async fn verify(&self) -> Result<bool> {
        self.session.verify(&self.rate_limiter).await
    }

    /// Whether the token has been verified
    pub async fn is_verified(&self) -> bool {
        self.session.is_verified().await
    }

    /// The underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rate limiter shared by all requests through this client
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.session.timeout()
    }

    /// Release the HTTP session. Later requests fail with `SessionClosed`.
    pub fn close(&self) {
        self.session.close();
    }

    /// Make a GET request against a v1 `api_action`
    pub async fn get(&self, path: &str, config: RequestConfig) -> Result<JsonValue> {
        self.request(Method::GET, Some(path), None, config).await
    }

    /// Make a request. `url` wins over `path`; a `path` is the v1
    /// `api_action` name.
    pub async fn request(
        &self,
        method: Method,
        path: Option<&str>,
        url: Option<&str>,
        config: RequestConfig,
    ) -> Result<JsonValue> {
        self.verify().await?;

        let url = self.resolve_url(path, url)?;
        let label = format!("{method} {}", config.endpoint.as_deref().unwrap_or(url.path()));
        let (url, config) = (&url, &config);

        self.retry
            .run(&label, move |attempt| async move {
                self.rate_limiter.acquire().await;
                debug!("{} {} (attempt {})", method, url, attempt);
                let response = self
                    .session
                    .send(method, url.clone(), &config.query, config.endpoint.as_deref())
                    .await?;
                interpret(response.status, &response.body)
            })
            .await
    }

    /// Build the target URL for a request
    pub fn resolve_url(&self, path: Option<&str>, url: Option<&str>) -> Result<Url> {
        match (url, path) {
            (Some(url), _) => Ok(Url::parse(url)?),
            (None, Some(action)) => v1_url(self.session.base_url(), action),
            (None, None) => Err(Error::config("request needs either a path or a url")),
        }
    }
}

/// `{base}/admin/api.php?api_action={action}&api_output=json`
pub fn v1_url(base_url: &str, action: &str) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/{V1_API_PATH}",
        base_url.trim_end_matches('/')
    ))?;
    url.query_pairs_mut()
        .append_pair("api_action", action)
        .append_pair("api_output", "json");
    Ok(url)
}

#[cfg(test)]
mod url_tests {
    use super::*;

    #[test]
    fn test_v1_url() {
        let url = v1_url("https://acct.api-us1.com/", "campaign_report_open_list").unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.api-us1.com/admin/api.php?api_action=campaign_report_open_list&api_output=json"
        );
    }

    #[test]
    fn test_v1_url_rejects_garbage_base() {
        assert!(matches!(
            v1_url("not a url", "x"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
