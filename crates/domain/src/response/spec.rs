//! Response specification type
//!
//! Holds what the executor observed for one request: the status code, the raw
//! body and timing. Transport failures are represented by a sentinel response
//! with status 0 so that evaluation never has to deal with a missing response.

use std::borrow::Cow;
use std::time::Duration;

use serde_json::Value;

/// Status code used for responses that never reached the server.
pub const UNREACHABLE_STATUS: u16 = 0;

/// HTTP response specification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseSpec {
    /// HTTP status code, 0 when the server was unreachable
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
    /// Round-trip time
    pub duration: Duration,
    /// Transport failure description for unreachable responses
    pub transport_error: Option<String>,
}

impl ResponseSpec {
    /// Creates a response received from the server.
    #[must_use]
    pub fn new(status: u16, body: Vec<u8>, duration: Duration) -> Self {
        Self {
            status,
            body,
            duration,
            transport_error: None,
        }
    }

    /// Creates the sentinel response for a request that failed in transport.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            status: UNREACHABLE_STATUS,
            body: Vec::new(),
            duration,
            transport_error: Some(reason.into()),
        }
    }

    /// Returns true if this is the transport failure sentinel.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        self.status == UNREACHABLE_STATUS
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_real_statuses_are_reachable() {
        let ok = ResponseSpec::new(200, b"{}".to_vec(), Duration::ZERO);
        assert!(!ok.is_unreachable());

        let broken = ResponseSpec::new(500, Vec::new(), Duration::ZERO);
        assert!(!broken.is_unreachable());
    }

    #[test]
    fn test_unreachable_sentinel() {
        let response = ResponseSpec::unreachable("connection refused", Duration::from_millis(3));
        assert_eq!(response.status, UNREACHABLE_STATUS);
        assert!(response.is_unreachable());
        assert_eq!(
            response.transport_error.as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn test_json_keeps_utf8() {
        let body = r#"{"city": "Санктгород"}"#.as_bytes().to_vec();
        let response = ResponseSpec::new(200, body, Duration::ZERO);
        let json = response.json().unwrap_or_default();
        assert_eq!(json["city"], "Санктгород");
    }

    #[test]
    fn test_json_parse_failure() {
        let response = ResponseSpec::new(400, Vec::new(), Duration::ZERO);
        assert!(response.json().is_err());
        assert_eq!(response.body_text(), "");
    }
}
