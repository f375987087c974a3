//! Harness configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ApplicationError, ApplicationResult};

/// Default server under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Where to send requests and how long to wait for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    base_url: Url,
    timeout: Duration,
}

impl HarnessConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL with a
    /// host, carries a query or fragment, or the timeout is zero.
    pub fn new(base_url: &str, timeout_ms: u64) -> ApplicationResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ApplicationError::InvalidConfig(format!("base URL '{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApplicationError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        if base_url.host_str().is_none() {
            return Err(ApplicationError::InvalidConfig(
                "base URL has no host".to_string(),
            ));
        }
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(ApplicationError::InvalidConfig(
                "base URL must not carry a query or fragment".to_string(),
            ));
        }
        if timeout_ms == 0 {
            return Err(ApplicationError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Base URL of the server under test.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Joins the base URL with a case path such as `/users/44/visits?country=Россия`.
    ///
    /// Any path prefix on the base URL is kept; non-ASCII query values are
    /// percent-encoded as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the joined string is not a valid URL.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
    }
}

impl Default for HarnessConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS).expect("default configuration is valid")
    }
}
