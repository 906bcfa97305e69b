//! HTTP client module
//!
//! Provides the ActiveCampaign v1 client with retry, rate limiting, and
//! response interpretation.
//!
//! # Features
//!
//! - **Verification**: The API token is checked once before the first data request
//! - **Rate Limiting**: Sliding window ceiling (5 calls per second by default)
//! - **Automatic Retries**: Exponential backoff on 5xx, 429 and transport failures
//! - **Response Handling**: Empty 200 bodies become `{}`; malformed bodies are fatal

mod client;
mod rate_limit;
mod response;
mod retry;
mod session;

pub use client::{
    v1_url, ActiveCampaignClient, ClientConfig, ClientConfigBuilder, RequestConfig,
    DEFAULT_REQUEST_TIMEOUT, V1_API_PATH,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use response::{default_message, error_message, interpret};
pub use retry::RetryPolicy;
pub use session::{RawResponse, Session, API_TOKEN_HEADER};
