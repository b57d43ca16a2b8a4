/*
 * Responsibility
 * - Debug listener endpoints (separate port, never exposed with the API)
 */
use std::sync::Arc;

use axum::{Json, extract::State};

use crate::middleware::metrics::{Metrics, MetricsSnapshot};

pub async fn metrics(State(metrics): State<Arc<Metrics>>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}
