//! Panic boundary.
//!
//! Wraps the whole API router, just inside the request counter: a panic
//! anywhere below it becomes a 500 with the usual error body, is logged, and
//! is counted once in `Metrics` (the counter outside sees the 500 as an error).

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::AppError;
use crate::middleware::metrics::Metrics;

fn panic_message(err: &(dyn Any + Send)) -> &str {
    if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    }
}

pub fn layer(
    metrics: Arc<Metrics>,
) -> CatchPanicLayer<impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone> {
    CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
        metrics.record_panic();
        tracing::error!(panic = panic_message(err.as_ref()), "request panicked");
        AppError::Internal.into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("boom")
    }

    #[tokio::test]
    async fn panic_becomes_500_and_is_counted_once() {
        let metrics = Arc::new(Metrics::default());
        let app = Router::new()
            .route("/boom", get(explode))
            .route("/fine", get(|| async { "fine" }))
            .layer(layer(metrics.clone()));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(metrics.snapshot().panics, 1);

        // still serving
        let response = app
            .oneshot(Request::builder().uri("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(metrics.snapshot().panics, 1);
    }
}
