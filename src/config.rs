//! Tap configuration
//!
//! The tap is configured with a JSON document holding the account URL, the
//! API token and a few sync settings. This module loads and validates that
//! document and turns it into a [`ClientConfig`].

use crate::error::{Error, Result};
use crate::http::{ClientConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Keys that must be present in every config document
pub const REQUIRED_CONFIG_KEYS: [&str; 4] = ["api_url", "api_token", "start_date", "user_agent"];

/// ActiveCampaign API flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiVersion {
    /// Legacy `admin/api.php` API
    #[default]
    V1,
    /// JSON REST API
    V3,
}

impl std::str::FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "V1" => Ok(Self::V1),
            "V3" => Ok(Self::V3),
            other => Err(Error::invalid_value(
                "api_version",
                format!("unknown API version '{other}'"),
            )),
        }
    }
}

/// Tap configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// Account API URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// API token
    #[serde(default)]
    pub api_token: Option<String>,

    /// Earliest date to replicate from
    #[serde(default)]
    pub start_date: Option<String>,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds, as a number or a string
    #[serde(default)]
    pub request_timeout: Option<Value>,

    /// API flavour, `V1` when absent
    #[serde(default)]
    pub api_version: Option<String>,
}

impl TapConfig {
    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config JSON: {e}")))
    }

    /// Check that every required key is present and non-empty
    pub fn validate(&self) -> Result<()> {
        let values = [
            &self.api_url,
            &self.api_token,
            &self.start_date,
            &self.user_agent,
        ];
        for (key, value) in REQUIRED_CONFIG_KEYS.iter().zip(values) {
            if value.clone().none_if_empty().is_none() {
                return Err(Error::missing_field(*key));
            }
        }
        self.api_version()?;
        self.request_timeout()?;
        Ok(())
    }

    /// Selected API flavour
    pub fn api_version(&self) -> Result<ApiVersion> {
        self.api_version
            .as_deref()
            .map_or(Ok(ApiVersion::V1), str::parse)
    }

    /// Effective request timeout
    pub fn request_timeout(&self) -> Result<Duration> {
        resolve_request_timeout(self.request_timeout.as_ref())
    }

    /// Build the HTTP client configuration. The token is passed through as-is
    /// so a missing token surfaces at first use.
    pub fn client_config(&self) -> Result<ClientConfig> {
        if self.api_version()? == ApiVersion::V3 {
            return Err(Error::config("api_version V3 is not supported by this tap"));
        }

        let api_url = self
            .api_url
            .clone()
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("api_url"))?;

        let mut builder = ClientConfig::builder(api_url).timeout(self.request_timeout()?);
        if let Some(token) = self.api_token.clone().none_if_empty() {
            builder = builder.api_token(token);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(builder.build())
    }
}

/// Resolve the configured timeout. Absent, `null`, zero, `"0"` and `""` all
/// mean the 300 second default.
pub fn resolve_request_timeout(value: Option<&Value>) -> Result<Duration> {
    let seconds = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            Error::invalid_value("request_timeout", format!("'{s}' is not a number"))
        })?,
        Some(Value::Bool(false)) => return Ok(DEFAULT_REQUEST_TIMEOUT),
        Some(other) => {
            return Err(Error::invalid_value(
                "request_timeout",
                format!("unsupported value {other}"),
            ))
        }
    };

    if seconds == 0.0 {
        return Ok(DEFAULT_REQUEST_TIMEOUT);
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        Error::invalid_value("request_timeout", format!("{seconds} seconds: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use test_case::test_case;

    fn full_config() -> TapConfig {
        TapConfig::from_json(
            r#"{
                "api_url": "https://acct.api-us1.com",
                "api_token": "secret",
                "start_date": "2024-01-01T00:00:00Z",
                "user_agent": "tap-activecampaign <ops@example.com>"
            }"#,
        )
        .unwrap()
    }

    #[test_case(None, 300.0 ; "absent")]
    #[test_case(Some(json!(null)), 300.0 ; "null")]
    #[test_case(Some(json!(0)), 300.0 ; "zero int")]
    #[test_case(Some(json!(0.0)), 300.0 ; "zero float")]
    #[test_case(Some(json!("0")), 300.0 ; "zero string")]
    #[test_case(Some(json!("")), 300.0 ; "empty string")]
    #[test_case(Some(json!(100)), 100.0 ; "int")]
    #[test_case(Some(json!(10.5)), 10.5 ; "float")]
    #[test_case(Some(json!("100")), 100.0 ; "int string")]
    #[test_case(Some(json!("2.5")), 2.5 ; "float string")]
    fn test_resolve_request_timeout(value: Option<Value>, expected: f64) {
        let timeout = resolve_request_timeout(value.as_ref()).unwrap();
        assert_eq!(timeout, Duration::from_secs_f64(expected));
    }

    #[test]
    fn test_resolve_request_timeout_rejects_garbage() {
        let err = resolve_request_timeout(Some(&json!("soon"))).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert!(resolve_request_timeout(Some(&json!(-5))).is_err());
        assert!(resolve_request_timeout(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_validate_full_config() {
        let config = full_config();
        config.validate().unwrap();
        assert_eq!(config.api_version().unwrap(), ApiVersion::V1);
    }

    #[test]
    fn test_validate_reports_missing_key() {
        let mut config = full_config();
        config.api_token = None;
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { field }) if field == "api_token"
        ));

        let mut config = full_config();
        config.user_agent = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { field }) if field == "user_agent"
        ));
    }

    #[test]
    fn test_api_version_parsing() {
        assert_eq!("v1".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!("V3".parse::<ApiVersion>().unwrap(), ApiVersion::V3);
        assert!("v2".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_client_config_from_tap_config() {
        let mut config = full_config();
        config.request_timeout = Some(json!("30"));

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url, "https://acct.api-us1.com");
        assert_eq!(client.api_token.as_deref(), Some("secret"));
        assert_eq!(
            client.user_agent.as_deref(),
            Some("tap-activecampaign <ops@example.com>")
        );
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_client_config_keeps_missing_token() {
        let mut config = full_config();
        config.api_token = None;
        let client = config.client_config().unwrap();
        assert!(client.api_token.is_none());
    }

    #[test]
    fn test_client_config_rejects_v3() {
        let mut config = full_config();
        config.api_version = Some("v3".into());
        assert!(matches!(config.client_config(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_url": "https://acct.api-us1.com", "api_token": "t", "request_timeout": 0}}"#
        )
        .unwrap();

        let config = TapConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("t"));
        assert_eq!(config.request_timeout().unwrap(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            TapConfig::from_file("/definitely/not/here.json"),
            Err(Error::Config { .. })
        ));
    }
}
