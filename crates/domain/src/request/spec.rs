//! Request specification type

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Specification for a single request against the server under test.
///
/// The path is always relative to the configured base URL; the host never
/// appears in suite data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Path and optional query string, starting with `/`
    pub path: String,
    /// JSON body sent with POST requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSpec {
    /// Creates a GET request for the given path.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Creates a POST request carrying a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Returns true if the path carries a query string.
    #[must_use]
    pub fn has_query(&self) -> bool {
        self.path.contains('?')
    }

    /// Checks that the request is well formed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, embeds a host, or a POST
    /// has no body.
    pub fn validate(&self) -> DomainResult<()> {
        if !self.path.starts_with('/') {
            return Err(DomainError::InvalidPath {
                path: self.path.clone(),
                reason: "must start with '/'".to_string(),
            });
        }
        if self.path.contains("://") {
            return Err(DomainError::InvalidPath {
                path: self.path.clone(),
                reason: "must not contain a scheme or host".to_string(),
            });
        }
        if self.method.has_body() && self.body.is_none() {
            return Err(DomainError::InvalidScenario(format!(
                "{} {} has no body",
                self.method, self.path
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<4} {}", self.method.as_str(), self.path)
    }
}
