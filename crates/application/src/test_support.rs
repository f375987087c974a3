//! In-memory HTTP doubles shared by the use case tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tripcheck_domain::request::HttpMethod;
use tripcheck_domain::response::ResponseSpec;

use crate::config::HarnessConfig;
use crate::executor::RequestExecutor;
use crate::ports::{HttpClient, HttpClientError, PreparedRequest};

type Handler = dyn Fn(HttpMethod, &str, Option<Value>) -> Option<(u16, String)> + Send + Sync;

/// Answers requests from a closure; `None` from the closure means the
/// connection is refused.
pub struct FakeServer {
    handler: Box<Handler>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new(
        handler: impl Fn(HttpMethod, &str, Option<Value>) -> Option<(u16, String)>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl HttpClient for FakeServer {
    fn execute(
        &self,
        request: &PreparedRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        let target = match request.url.query() {
            Some(query) => format!("{}?{query}", request.url.path()),
            None => request.url.path().to_string(),
        };
        if let Ok(mut log) = self.requests.lock() {
            log.push(format!("{} {target}", request.method));
        }
        let body = request
            .body
            .as_deref()
            .and_then(|bytes| serde_json::from_slice(bytes).ok());
        let result = match (self.handler)(request.method, &target, body) {
            Some((status, body)) => Ok(ResponseSpec::new(
                status,
                body.into_bytes(),
                Duration::from_millis(1),
            )),
            None => Err(HttpClientError::ConnectionRefused {
                host: "localhost".to_string(),
                port: 8080,
            }),
        };
        async move { result }
    }
}

pub fn executor(server: FakeServer) -> RequestExecutor<FakeServer> {
    RequestExecutor::new(Arc::new(server), HarnessConfig::default())
}

#[derive(Debug, Clone, Copy)]
struct Visit {
    user: u64,
    location: u64,
    mark: u64,
}

/// A tiny travel service: visits plus the derived per-user and
/// per-location views.
#[derive(Debug)]
pub struct TravelState {
    visits: BTreeMap<u64, Visit>,
    /// When set, `/avg` keeps serving the value computed at startup.
    pub stale_averages: bool,
    frozen: BTreeMap<u64, f64>,
}

impl TravelState {
    pub fn seeded() -> Self {
        let visits = BTreeMap::from([
            (
                123,
                Visit {
                    user: 46,
                    location: 7,
                    mark: 4,
                },
            ),
            (
                124,
                Visit {
                    user: 46,
                    location: 7,
                    mark: 2,
                },
            ),
            (
                125,
                Visit {
                    user: 111,
                    location: 9,
                    mark: 5,
                },
            ),
        ]);
        let mut state = Self {
            visits,
            stale_averages: false,
            frozen: BTreeMap::new(),
        };
        state.frozen = [7, 9, 111]
            .into_iter()
            .map(|id| (id, state.average(id)))
            .collect();
        state
    }

    fn average(&self, location: u64) -> f64 {
        let marks: Vec<u64> = self
            .visits
            .values()
            .filter(|v| v.location == location)
            .map(|v| v.mark)
            .collect();
        if marks.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let avg = marks.iter().sum::<u64>() as f64 / marks.len() as f64;
        (avg * 100_000.0).round() / 100_000.0
    }

    fn handle(&mut self, method: HttpMethod, target: &str, body: Option<Value>) -> (u16, String) {
        let path = target.split('?').next().unwrap_or_default();
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let id = |i: usize| parts.get(i).and_then(|s| s.parse::<u64>().ok());
        match (method, parts.as_slice()) {
            (HttpMethod::Get, ["visits", _]) => match id(1).and_then(|i| self.visits.get(&i)) {
                Some(v) => (
                    200,
                    json!({"user": v.user, "location": v.location, "mark": v.mark}).to_string(),
                ),
                None => (404, "{}".to_string()),
            },
            (HttpMethod::Get, ["users", _, "visits"]) => {
                let Some(user) = id(1) else {
                    return (404, "{}".to_string());
                };
                let visits: Vec<Value> = self
                    .visits
                    .values()
                    .filter(|v| v.user == user)
                    .map(|v| json!({"mark": v.mark, "place": "Pl"}))
                    .collect();
                (200, json!({ "visits": visits }).to_string())
            }
            (HttpMethod::Get, ["locations", _, "avg"]) => {
                let Some(location) = id(1) else {
                    return (404, "{}".to_string());
                };
                let avg = if self.stale_averages {
                    self.frozen.get(&location).copied().unwrap_or_default()
                } else {
                    self.average(location)
                };
                (200, json!({ "avg": avg }).to_string())
            }
            (HttpMethod::Post, ["visits", _]) => {
                let (Some(visit), Some(Value::Object(update))) =
                    (id(1).and_then(|i| self.visits.get_mut(&i)), body)
                else {
                    return (400, "{}".to_string());
                };
                for (key, value) in update {
                    let Some(number) = value.as_u64() else {
                        return (400, "{}".to_string());
                    };
                    match key.as_str() {
                        "user" => visit.user = number,
                        "location" => visit.location = number,
                        "mark" => visit.mark = number,
                        _ => return (400, "{}".to_string()),
                    }
                }
                (200, "{}".to_string())
            }
            _ => (404, "{}".to_string()),
        }
    }
}

pub fn travel_server(state: TravelState) -> FakeServer {
    let state = Mutex::new(state);
    FakeServer::new(move |method, target, body| {
        let mut state = state.lock().ok()?;
        Some(state.handle(method, target, body))
    })
}
