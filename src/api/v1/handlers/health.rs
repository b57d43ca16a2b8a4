/*
 * Responsibility
 * - GET /liveness: the process is up (no dependencies checked)
 * - GET /readiness: the database answers within one second
 * - Both sit outside the auth chain
 */
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn liveness() -> impl IntoResponse {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());
    (
        StatusCode::OK,
        Json(json!({
            "status": "up",
            "build": env!("CARGO_PKG_VERSION"),
            "host": host,
        })),
    )
}

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let ping = sqlx::query("SELECT 1").execute(&state.db);

    match tokio::time::timeout(READINESS_TIMEOUT, ping).await {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Ok(Err(err)) => {
            tracing::warn!(error = ?err, "readiness: database ping failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "db not ready"})),
            )
        }
        Err(_) => {
            tracing::warn!("readiness: database ping timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "db not ready"})),
            )
        }
    }
}
