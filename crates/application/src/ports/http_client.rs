//! HTTP Client port

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tripcheck_domain::{request::HttpMethod, response::ResponseSpec};
use url::Url;

/// A request ready to go on the wire: absolute URL, encoded body, deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL (base URL joined with the case path).
    pub url: Url,
    /// UTF-8 JSON body.
    pub body: Option<Vec<u8>>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Transport-level failures reported by an [`HttpClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The server actively refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Host name resolution failed.
    #[error("could not resolve {host}: {message}")]
    DnsError {
        /// Target host.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Anything else, including failures while reading the body.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
pub trait HttpClient: Send + Sync {
    /// Executes a prepared request and returns the response.
    ///
    /// Any status code, including 4xx and 5xx, is a successful execution.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures: refused connections,
    /// timeouts, unreadable bodies.
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send;
}
