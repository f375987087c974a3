//! Request executor
//!
//! Turns a case's [`RequestSpec`] into exactly one [`ResponseSpec`]. Transport
//! failures never escape: they come back as the unreachable sentinel so the
//! evaluator can report them like any other outcome.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use tripcheck_domain::{request::RequestSpec, response::ResponseSpec};

use crate::config::HarnessConfig;
use crate::ports::{HttpClient, HttpClientError, PreparedRequest};

/// Issues requests against the configured server.
///
/// # Example
///
/// ```ignore
/// let client = ReqwestHttpClient::new()?;
/// let executor = RequestExecutor::new(Arc::new(client), HarnessConfig::default());
///
/// let response = executor.execute(&RequestSpec::get("/users/1")).await;
/// ```
pub struct RequestExecutor<C: HttpClient> {
    client: Arc<C>,
    config: HarnessConfig,
}

impl<C: HttpClient> RequestExecutor<C> {
    /// Creates an executor with the given HTTP client and configuration.
    pub const fn new(client: Arc<C>, config: HarnessConfig) -> Self {
        Self { client, config }
    }

    /// The configuration requests are sent with.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Executes the request; never fails.
    ///
    /// Connection errors, timeouts and unbuildable URLs yield
    /// [`ResponseSpec::unreachable`] with status 0.
    pub async fn execute(&self, request: &RequestSpec) -> ResponseSpec {
        let start = Instant::now();
        match self.try_execute(request).await {
            Ok(response) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    elapsed_ms = start.elapsed().as_millis(),
                    "response received"
                );
                response
            }
            Err(error) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    %error,
                    "request failed in transport"
                );
                ResponseSpec::unreachable(error.to_string(), start.elapsed())
            }
        }
    }

    async fn try_execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        let url = self
            .config
            .url_for(&request.path)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.path)))?;
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?;

        let prepared = PreparedRequest {
            method: request.method,
            url,
            body,
            timeout: self.config.timeout(),
        };
        debug!(method = %prepared.method, url = %prepared.url, "sending request");

        // The adapter applies its own timeout; this bounds misbehaving adapters too.
        tokio::time::timeout(prepared.timeout, self.client.execute(&prepared))
            .await
            .unwrap_or_else(|_| {
                Err(HttpClientError::Timeout {
                    timeout_ms: u64::try_from(prepared.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;
    use tripcheck_domain::request::HttpMethod;

    /// Mock HTTP client for testing.
    struct MockHttpClient {
        response: Result<ResponseSpec, HttpClientError>,
        delay: Duration,
        seen: Mutex<Vec<PreparedRequest>>,
    }

    impl MockHttpClient {
        fn success(status: u16, body: &str) -> Self {
            Self {
                response: Ok(ResponseSpec::new(
                    status,
                    body.as_bytes().to_vec(),
                    Duration::from_millis(5),
                )),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn error(err: HttpClientError) -> Self {
            Self {
                response: Err(err),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::success(200, "{}")
            }
        }
    }

    impl HttpClient for MockHttpClient {
        fn execute(
            &self,
            request: &PreparedRequest,
        ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            let result = self.response.clone();
            let delay = self.delay;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
        }
    }

    fn executor(client: MockHttpClient, timeout_ms: u64) -> RequestExecutor<MockHttpClient> {
        let config = HarnessConfig::new("http://localhost:8080", timeout_ms).unwrap_or_default();
        RequestExecutor::new(Arc::new(client), config)
    }

    #[tokio::test]
    async fn test_execute_success() {
        let executor = executor(MockHttpClient::success(200, r#"{"first_name":"Пётр"}"#), 1_000);

        let response = executor.execute(&RequestSpec::get("/users/1")).await;

        assert_eq!(response.status, 200);
        assert!(!response.is_unreachable());
    }

    #[tokio::test]
    async fn test_execute_builds_absolute_url_and_utf8_body() {
        let client = Arc::new(MockHttpClient::success(200, "{}"));
        let config = HarnessConfig::new("http://10.0.0.1:80", 1_000).unwrap_or_default();
        let executor = RequestExecutor::new(Arc::clone(&client), config);

        let request = RequestSpec::post("/users/52", json!({"first_name": "Маша"}));
        executor.execute(&request).await;

        let seen = client.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].url.as_str(), "http://10.0.0.1/users/52");
        assert_eq!(
            seen[0].body.as_deref(),
            Some(r#"{"first_name":"Маша"}"#.as_bytes())
        );
        assert_eq!(seen[0].timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_transport_error_becomes_sentinel() {
        let executor = executor(
            MockHttpClient::error(HttpClientError::ConnectionRefused {
                host: "localhost".to_string(),
                port: 8080,
            }),
            1_000,
        );

        let response = executor.execute(&RequestSpec::get("/users/1")).await;

        assert!(response.is_unreachable());
        assert_eq!(
            response.transport_error.as_deref(),
            Some("connection refused by localhost:8080")
        );
    }

    #[tokio::test]
    async fn test_hung_server_times_out() {
        let executor = executor(MockHttpClient::slow(Duration::from_secs(5)), 50);

        let response = executor.execute(&RequestSpec::get("/users/1")).await;

        assert!(response.is_unreachable());
        assert_eq!(
            response.transport_error.as_deref(),
            Some("request timed out after 50ms")
        );
    }
}
