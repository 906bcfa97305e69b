//! # tap-activecampaign
//!
//! Extraction tap for the ActiveCampaign v1 (`admin/api.php`) API.
//!
//! The core is a resilient HTTP client that streams rely on when paging
//! through a rate-limited legacy API that occasionally returns empty or
//! malformed bodies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_activecampaign::http::{ActiveCampaignClient, ClientConfig, RequestConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_activecampaign::Result<()> {
//!     let config = ClientConfig::builder("https://myaccount.api-us1.com")
//!         .api_token("...")
//!         .user_agent("tap-activecampaign <ops@example.com>")
//!         .build();
//!     let client = ActiveCampaignClient::connect(config).await?;
//!
//!     let page = client
//!         .get("campaign_report_open_list", RequestConfig::new().query("campaignid", 123))
//!         .await?;
//!     println!("{page}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │            ActiveCampaignClient::request / get            │
//! └───────────────────────────────────────────────────────────┘
//!          │ verify once      │ per attempt
//! ┌────────┴───────┬──────────┴──────┬────────────┬───────────┐
//! │    Session     │   RetryPolicy   │ RateLimiter│ interpret │
//! ├────────────────┼─────────────────┼────────────┼───────────┤
//! │ Api-Token hdr  │ 5 tries, 2^n    │ 5 per 1s   │ {} on ""  │
//! │ pool, close()  │ 5xx/429/network │ sliding    │ status err│
//! └────────────────┴─────────────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with verification, retry and rate limiting
pub mod http;

/// Tap configuration
pub mod config;

/// State management and checkpointing
pub mod state;

/// RECORD/STATE output messages
pub mod message;

/// Page-numbered v1 reads
pub mod stream;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{is_retryable, Error, ErrorKind, Result};
pub use http::{ActiveCampaignClient, ClientConfig, RequestConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
