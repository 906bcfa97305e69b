//! Response interpretation
//!
//! Turns a status code and raw body into either a parsed JSON payload or a
//! classified [`Error`]. ActiveCampaign's v1 API answers some successful
//! calls with an empty body, so an empty 200 body is an empty object rather
//! than an error. A non-empty 200 body that fails to parse is fatal.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use tracing::error;

/// Interpret a raw response
pub fn interpret(status: u16, body: &[u8]) -> Result<Value> {
    if status != 200 {
        return Err(Error::api(status, error_message(status, body)));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Ok(value),
        Err(e) => {
            let content = String::from_utf8_lossy(body);
            error!("{}", e);
            error!("response content: {:?}", content);
            if body.is_empty() {
                Ok(Value::Object(Map::new()))
            } else {
                Err(Error::malformed(e.to_string(), content))
            }
        }
    }
}

/// Derive an error message from a failed response body, falling back to the
/// documented meaning of the status code
pub fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(message_from_body)
        .unwrap_or_else(|| default_message(status).to_string())
}

fn message_from_body(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    for key in ["message", "error", "result_message"] {
        if let Some(msg) = obj.get(key).and_then(Value::as_str) {
            if !msg.is_empty() {
                return Some(msg.to_string());
            }
        }
    }

    // v3-style {"errors": [{"title": ..., "detail": ...}]}
    let first = obj.get("errors")?.as_array()?.first()?;
    first
        .get("title")
        .or_else(|| first.get("detail"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Documented meaning of common ActiveCampaign status codes
pub fn default_message(status: u16) -> &'static str {
    match status {
        400 => "The request is missing or has a bad parameter.",
        401 => "Invalid authorization credentials.",
        403 => "User does not have permission to access the resource.",
        404 => "The resource you have specified cannot be found.",
        422 => "The request could not be processed due to validation errors.",
        429 => "The API rate limit for your account has been exceeded.",
        500..=599 => "The server encountered an unexpected condition which prevented it from fulfilling the request.",
        _ => "Unknown Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Log sink shared between the subscriber and the assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_valid_json_round_trips() {
        let payload = json!({
            "0": {"subscriberid": "111", "email": "a@example.com"},
            "result_code": 1,
            "result_message": "Success: Something is returned",
            "result_output": "json"
        });
        let body = serde_json::to_vec(&payload).unwrap();

        assert_eq!(interpret(200, &body).unwrap(), payload);
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(interpret(200, b"").unwrap(), json!({}));
    }

    #[test]
    fn test_non_json_body_is_fatal() {
        let err = interpret(200, b"not-json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        match err {
            Error::MalformedResponse { content, .. } => assert_eq!(content, "not-json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_xml_body_is_fatal() {
        let body = b"<?xml version='1.0' encoding='utf-8'?><not_allowed><error>You are not authorized to access this file</error></not_allowed>";
        assert!(matches!(
            interpret(200, body),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_non_200_carries_status_and_body_message() {
        let err = interpret(404, br#"{"message": "No Result found for Campaign"}"#).unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "No Result found for Campaign");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_200_with_errors_array() {
        let body = br#"{"errors": [{"title": "Field is required", "source": {"pointer": "/data"}}]}"#;
        assert_eq!(error_message(422, body), "Field is required");
    }

    #[test]
    fn test_non_200_unparseable_body_uses_default() {
        assert_eq!(
            error_message(401, b"<html>nope</html>"),
            "Invalid authorization credentials."
        );
        assert_eq!(error_message(418, b""), "Unknown Error");
    }

    #[test]
    fn test_non_200_success_codes_are_errors() {
        assert!(matches!(
            interpret(204, b""),
            Err(Error::Api { status: 204, .. })
        ));
    }

    #[test]
    fn test_server_error_is_transient() {
        let err = interpret(502, b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.to_string().contains("unexpected condition"));
    }

    #[test]
    fn test_malformed_body_is_logged_with_content() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            interpret(200, b"<html>maintenance</html>")
        });
        assert!(result.is_err());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("<html>maintenance</html>"));
    }
}
