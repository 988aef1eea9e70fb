//! Request counters and latencies in Prometheus text format.

use super::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Counters {
    /// (method, path, status) -> requests
    requests: BTreeMap<(String, String, u16), u64>,
    /// (method, path) -> (total seconds, observations)
    durations: BTreeMap<(String, String), (f64, u64)>,
}

#[derive(Default)]
pub struct HttpMetrics {
    counters: Mutex<Counters>,
}

impl HttpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        *counters
            .requests
            .entry((method.to_string(), path.to_string(), status))
            .or_default() += 1;
        let (sum, count) = counters
            .durations
            .entry((method.to_string(), path.to_string()))
            .or_default();
        *sum += elapsed.as_secs_f64();
        *count += 1;
    }

    pub fn render(&self) -> String {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = String::new();

        let _ = writeln!(out, "# HELP http_requests_total Total number of HTTP requests.");
        let _ = writeln!(out, "# TYPE http_requests_total counter");
        for ((method, path, status), value) in &counters.requests {
            let _ = writeln!(
                out,
                "http_requests_total{{method=\"{method}\",path=\"{path}\",status=\"{status}\"}} {value}"
            );
        }

        let _ = writeln!(out, "# HELP http_request_duration_seconds HTTP request latency.");
        let _ = writeln!(out, "# TYPE http_request_duration_seconds summary");
        for ((method, path), (sum, count)) in &counters.durations {
            let labels = format!("method=\"{method}\",path=\"{path}\"");
            let _ = writeln!(out, "http_request_duration_seconds_sum{{{labels}}} {sum}");
            let _ = writeln!(out, "http_request_duration_seconds_count{{{labels}}} {count}");
        }

        out
    }
}

/// Middleware recording one observation per routed request.
pub async fn track(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    tracing::debug!(%method, %path, status, ?elapsed, "request handled");
    state.metrics.record(&method, &path, status, elapsed);

    response
}
