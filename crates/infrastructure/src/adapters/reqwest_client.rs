//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It handles all HTTP communication for the harness.

use std::error::Error as _;
use std::future::Future;
use std::time::Instant;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::trace;
use tripcheck_application::ports::{HttpClient, HttpClientError, PreparedRequest};
use tripcheck_domain::{request::HttpMethod, response::ResponseSpec};

/// Content type sent with every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` and implements the `HttpClient` port from the
/// application layer. Non-2xx statuses are ordinary responses; only
/// transport problems become errors.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - User-Agent: "tripcheck/<version>"
    /// - Per-request timeout taken from each [`PreparedRequest`]
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("tripcheck/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    ///
    /// reqwest's own message is generic, so the whole source chain is
    /// searched for the underlying cause.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        let message = error_chain(error);
        if error.is_connect() {
            let lowered = message.to_lowercase();
            let host = error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return HttpClientError::DnsError { host, message };
            }
            if lowered.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(reqwest::Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(message)
    }
}

/// Joins an error and all of its sources into one line.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        let method = request.method;
        let url = request.url.clone();
        let body = request.body.clone();
        let timeout = request.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        async move {
            let start = Instant::now();

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), url)
                .timeout(timeout);
            if let Some(body) = body {
                builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;
            let status = response.status().as_u16();

            // A body that stalls or breaks mid-read counts as a transport failure.
            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| match Self::map_error(&e, timeout_ms) {
                    timeout @ HttpClientError::Timeout { .. } => timeout,
                    other => HttpClientError::Other(format!("failed to read body: {other}")),
                })?
                .to_vec();

            let duration = start.elapsed();
            trace!(status, bytes = body_bytes.len(), ?duration, "body read");
            Ok(ResponseSpec::new(status, body_bytes, duration))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use url::Url;

    async fn spawn_server() -> Url {
        let app = Router::new()
            .route(
                "/users/1",
                get(|| async { r#"{"id":1,"first_name":"Пётр"}"# }),
            )
            .route(
                "/users/{id}",
                post(|headers: HeaderMap, body: String| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if content_type == JSON_CONTENT_TYPE && body.contains("Маша") {
                        (StatusCode::OK, "{}".to_string())
                    } else {
                        (StatusCode::BAD_REQUEST, content_type)
                    }
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "{}"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn prepared(method: HttpMethod, url: Url, body: Option<&str>, timeout_ms: u64) -> PreparedRequest {
        PreparedRequest {
            method,
            url,
            body: body.map(|b| b.as_bytes().to_vec()),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
    }

    #[test]
    fn test_client_creation() {
        let client = ReqwestHttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_returns_status_and_utf8_body() {
        let base = spawn_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let response = client
            .execute(&prepared(HttpMethod::Get, base.join("/users/1").unwrap(), None, 2_000))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body_text(), r#"{"id":1,"first_name":"Пётр"}"#);
    }

    #[tokio::test]
    async fn test_not_found_is_a_response() {
        let base = spawn_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let response = client
            .execute(&prepared(HttpMethod::Get, base.join("/locations/1000000").unwrap(), None, 2_000))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_post_sends_json_content_type() {
        let base = spawn_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let response = client
            .execute(&prepared(
                HttpMethod::Post,
                base.join("/users/52").unwrap(),
                Some(r#"{"first_name":"Маша"}"#),
                2_000,
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 200, "{}", response.body_text());
        assert_eq!(response.body_text(), "{}");
    }

    #[tokio::test]
    async fn test_timeout() {
        let base = spawn_server().await;
        let client = ReqwestHttpClient::new().unwrap();

        let result = client
            .execute(&prepared(HttpMethod::Get, base.join("/slow").unwrap(), None, 100))
            .await;

        assert_eq!(result, Err(HttpClientError::Timeout { timeout_ms: 100 }));
    }

    #[tokio::test]
    async fn test_closed_port_is_a_connection_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ReqwestHttpClient::new().unwrap();

        let result = client
            .execute(&prepared(
                HttpMethod::Get,
                Url::parse(&format!("http://{addr}/users/1")).unwrap(),
                None,
                2_000,
            ))
            .await;

        assert!(
            matches!(
                result,
                Err(HttpClientError::ConnectionRefused { .. } | HttpClientError::ConnectionFailed(_))
            ),
            "{result:?}"
        );
    }
}
