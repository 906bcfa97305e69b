//! Error types for the ActiveCampaign tap
//!
//! This module defines the error hierarchy for the entire tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Retry decisions never look at how an error was raised: [`Error::kind`]
//! maps every error onto an [`ErrorKind`] and [`is_retryable`] decides from
//! the kind alone.

use thiserror::Error;

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    // ============================================================================
    // API Errors
    // ============================================================================
    /// Credential verification was answered with a non-200 status
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// A data request was answered with a non-200 status
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// A 200 response whose non-empty body is not valid JSON
    #[error("Malformed response body: {message}")]
    MalformedResponse { message: String, content: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP session is closed")]
    SessionClosed,

    // ============================================================================
    // Local Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("State error: {message}")]
    State { message: String },

    #[error("{0}")]
    Other(String),
}

/// Classification of an [`Error`] used for retry and abort decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration; raised before any network activity
    Config,
    /// Credentials rejected during verification
    Authentication,
    /// 5xx, 429 or a connection-level failure
    Transient,
    /// 4xx other than 429 on a data request
    Client,
    /// Non-empty 200 body that is not JSON
    MalformedResponse,
    /// Local state/checkpoint failures
    State,
    /// Anything not classified above
    Unclassified,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create an API status error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>, content: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            content: content.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::InvalidUrl(_)
            | Error::SessionClosed => ErrorKind::Config,

            Error::Auth { status, .. } if is_retryable_status(*status) => ErrorKind::Transient,
            Error::Auth { .. } => ErrorKind::Authentication,

            Error::Api { status, .. } if is_retryable_status(*status) => ErrorKind::Transient,
            Error::Api { .. } => ErrorKind::Client,

            Error::MalformedResponse { .. } | Error::JsonParse(_) => ErrorKind::MalformedResponse,

            // A builder error means the request itself could not be formed
            Error::Http(e) if e.is_builder() => ErrorKind::Config,
            Error::Http(_) | Error::Timeout { .. } | Error::Io(_) => ErrorKind::Transient,

            Error::State { .. } => ErrorKind::State,

            Error::Other(_) => ErrorKind::Unclassified,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        is_retryable(self)
    }
}

/// Decide whether a failed attempt should be retried
pub fn is_retryable(error: &Error) -> bool {
    matches!(error.kind(), ErrorKind::Transient | ErrorKind::Unclassified)
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("api_token");
        assert_eq!(err.to_string(), "Missing required config field: api_token");

        let err = Error::api(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::auth(401, "Invalid authorization credentials.");
        assert_eq!(
            err.to_string(),
            "Authentication failed (HTTP 401): Invalid authorization credentials."
        );
    }

    #[test_case(500, true ; "internal server error")]
    #[test_case(502, true ; "bad gateway")]
    #[test_case(503, true ; "service unavailable")]
    #[test_case(524, true ; "cloudflare timeout")]
    #[test_case(429, true ; "too many requests")]
    #[test_case(400, false ; "bad request")]
    #[test_case(401, false ; "unauthorized")]
    #[test_case(403, false ; "forbidden")]
    #[test_case(404, false ; "not found")]
    #[test_case(422, false ; "unprocessable")]
    fn test_api_status_retryable(status: u16, expected: bool) {
        assert_eq!(is_retryable(&Error::api(status, "")), expected);
        assert_eq!(is_retryable(&Error::auth(status, "")), expected);
    }

    #[test]
    fn test_kind_distinguishes_auth_from_client() {
        assert_eq!(Error::auth(401, "").kind(), ErrorKind::Authentication);
        assert_eq!(Error::api(401, "").kind(), ErrorKind::Client);
        assert_eq!(Error::auth(503, "").kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_non_retryable_kinds() {
        assert!(!Error::config("missing token").is_retryable());
        assert!(!Error::missing_field("api_url").is_retryable());
        assert!(!Error::malformed("expected value", "not-json").is_retryable());
        assert!(!Error::state("bad state").is_retryable());
        assert!(!Error::SessionClosed.is_retryable());
    }

    #[test]
    fn test_transport_and_unclassified_are_retryable() {
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(Error::Io(reset).is_retryable());
        assert!(Error::Other("something odd".into()).is_retryable());
        assert_eq!(
            Error::Other("something odd".into()).kind(),
            ErrorKind::Unclassified
        );
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(Error::api(404, "").status(), Some(404));
        assert_eq!(Error::auth(401, "").status(), Some(401));
        assert_eq!(Error::config("x").status(), None);
    }
}
