//! Process-wide request counters.
//!
//! `track` counts every request and every failed response; the panic boundary
//! (`middleware::panics`) counts panics. `track` is mounted outside that
//! boundary, so a recovered panic counts as a panic and as an error.
//! Counters are relaxed atomics shared
//! through an `Arc`, read by `GET /debug/metrics`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use serde::Serialize;

use crate::error::ReportedError;

#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    panics: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
}

impl Metrics {
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}

/// Counts the request, and the response as an error when it failed.
pub async fn track(State(metrics): State<Arc<Metrics>>, request: Request, next: Next) -> Response {
    metrics.record_request();

    let response = next.run(request).await;

    if response.extensions().get::<ReportedError>().is_some()
        || response.status().is_server_error()
        || response.status().is_client_error()
    {
        metrics.record_error();
    }

    response
}
