//! Request counters exposed on the admin surface.
//!
//! Observability glue, not core logic: handlers never read these, a router
//! layer feeds them, and the admin metrics endpoint snapshots them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

use crate::db::AppState;

#[derive(Debug)]
pub struct Metrics {
    started_at: Instant,
    total_requests: AtomicU64,
    endpoint_hits: Mutex<HashMap<String, u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            endpoint_hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, endpoint: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut hits) = self.endpoint_hits.lock() {
            *hits.entry(endpoint.to_string()).or_insert(0) += 1;
        }
    }

    /// Current counters: the `top` busiest endpoints plus an `other` bucket
    /// covering the rest.
    pub fn snapshot(&self, top: usize) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let mut counts: Vec<(String, u64)> = self
            .endpoint_hits
            .lock()
            .map(|hits| hits.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let top_endpoints: Vec<EndpointCount> = counts
            .iter()
            .take(top)
            .map(|(endpoint, hits)| EndpointCount {
                endpoint: endpoint.clone(),
                hits: *hits,
            })
            .collect();
        let other = total_requests - top_endpoints.iter().map(|e| e.hits).sum::<u64>();

        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            total_requests,
            top_endpoints,
            other,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub hits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub top_endpoints: Vec<EndpointCount>,
    /// Requests outside the top endpoints.
    pub other: u64,
}

/// Router layer feeding the counters. Admin traffic is excluded so the
/// reporting surface does not count itself.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    if !path.starts_with("/admin") {
        state.metrics.record(&path);
    }
    next.run(request).await
}
