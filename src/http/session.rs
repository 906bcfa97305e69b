//! HTTP session lifecycle
//!
//! The session owns the connection pool, attaches the ActiveCampaign auth
//! headers to every call and verifies the API token once before first use.
//! Closing is idempotent and also happens on drop, so the pool is released
//! on every exit path.

use super::rate_limit::RateLimiter;
use super::response::error_message;
use super::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Header carrying the API token (`Api-Token`)
pub const API_TOKEN_HEADER: HeaderName = HeaderName::from_static("api-token");

/// Raw outcome of one HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

/// Authenticated HTTP session
pub struct Session {
    http: RwLock<Option<Client>>,
    base_url: String,
    api_token: Option<String>,
    user_agent: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    verified: Mutex<bool>,
}

impl Session {
    /// Open a session
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        user_agent: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http: RwLock::new(Some(http)),
            base_url: base_url.into(),
            api_token,
            user_agent,
            timeout,
            retry,
            verified: Mutex::new(false),
        })
    }

    /// Base URL of the account
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers attached to every call. Fails before any network activity if
    /// the token is missing.
    pub fn headers(&self) -> Result<HeaderMap> {
        let token = self
            .api_token
            .as_deref()
            .ok_or_else(|| Error::config("Missing api_token"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            API_TOKEN_HEADER,
            HeaderValue::from_str(token)
                .map_err(|e| Error::invalid_value("api_token", e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(agent) = &self.user_agent {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(agent)
                    .map_err(|e| Error::invalid_value("user_agent", e.to_string()))?,
            );
        }
        Ok(headers)
    }

    /// Issue one HTTP call. `endpoint` tags the timing log line.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        endpoint: Option<&str>,
    ) -> Result<RawResponse> {
        let headers = self.headers()?;
        let http = self.client()?;

        let mut req = http
            .request(method.into(), url)
            .headers(headers)
            .timeout(self.timeout);
        if !query.is_empty() {
            req = req.query(query);
        }

        let started = Instant::now();
        let response = req.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;

        debug!(
            endpoint = endpoint.unwrap_or("-"),
            http_status_code = status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "http request"
        );

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }

    /// Verify the API token against the base endpoint. Performed at most once;
    /// later calls return the cached result without touching the network.
    /// Every attempt takes a slot from `limiter`.
    pub async fn verify(&self, limiter: &RateLimiter) -> Result<bool> {
        let mut verified = self.verified.lock().await;
        if *verified {
            return Ok(true);
        }

        self.retry
            .run("verify api token", move |_| async move {
                limiter.acquire().await;
                self.check_api_token().await
            })
            .await?;

        *verified = true;
        info!("API token verified");
        Ok(true)
    }

    /// Whether verification has already succeeded
    pub async fn is_verified(&self) -> bool {
        *self.verified.lock().await
    }

    async fn check_api_token(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        let response = self.send(Method::GET, url, &[], None).await?;

        if response.status == 200 {
            return Ok(());
        }

        // Only the status matters here; a 200 body may even be XML
        Err(Error::auth(
            response.status,
            error_message(response.status, &response.body),
        ))
    }

    /// Release the connection pool. Safe to call more than once.
    pub fn close(&self) {
        let mut http = self.http.write().unwrap_or_else(PoisonError::into_inner);
        if http.take().is_some() {
            debug!("HTTP session closed");
        }
    }

    /// Whether the session has been closed
    pub fn is_closed(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn client(&self) -> Result<Client> {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::SessionClosed)
    }

    fn map_transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(e)
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("has_token", &self.api_token.is_some())
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
