/*
 * Responsibility
 * - Load Config -> build dependencies (pool, token service, counters) -> assemble Routers
 * - Apply the outer middleware (panic boundary, transport, CORS, counters)
 * - Serve the API and the debug listener with graceful shutdown
 */
use std::{panic, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, middleware::from_fn_with_state, routing::get};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{
    self,
    v1::handlers::{
        debug,
        health::{liveness, readiness},
    },
};
use crate::config::Config;
use crate::middleware::{
    cors, http,
    metrics::{Metrics, track},
    panics,
};
use crate::services::auth::{AuthService, TokenSettings};
use crate::state::AppState;

pub fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cdn_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    // try_init: the admin binary and tests may call this more than once
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost
        // (stderr can be hidden depending on how the process is launched).
        // The request's panic boundary answers 500; the process keeps serving.
        tracing::error!(%info, "panic");
        default_hook(info);
    }))
}

pub async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook();

    tracing::info!(
        "starting API in {:?} mode on {} (debug {})",
        config.app_env,
        config.addr,
        config.debug_addr
    );

    let db = connect(&config).await?;
    if config.db_migrate_on_start {
        migrate(&db).await?;
        tracing::info!("migrations applied");
    }

    let auth = Arc::new(AuthService::new(&TokenSettings::from(&config))?);
    if !auth.can_sign() {
        tracing::warn!("ACCESS_JWT_PRIVATE_KEY_PEM not set; token endpoint will fail");
    }
    let metrics = Arc::new(Metrics::default());
    let state = AppState::new(db, auth, metrics.clone());

    let app = build_router(state, &config);
    let debug_app = build_debug_router(metrics);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let debug_listener = tokio::net::TcpListener::bind(config.debug_addr).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut api_task = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_requested(shutdown_rx.clone()))
            .into_future(),
    );
    let debug_task = tokio::spawn(
        axum::serve(debug_listener, debug_app)
            .with_graceful_shutdown(shutdown_requested(shutdown_rx))
            .into_future(),
    );

    tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("shutdown started");
        }
        result = &mut api_task => {
            // the API server stopped on its own; nothing left to drain
            result??;
            return Ok(());
        }
    }

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(config.shutdown_timeout, api_task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            timeout = ?config.shutdown_timeout,
            "graceful shutdown timed out; dropping open connections"
        ),
    }
    debug_task.abort();

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let metrics = state.metrics.clone();

    let router = Router::new()
        .route("/liveness", get(liveness))
        .route("/readiness", get(readiness))
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state);

    with_outer_layers(router, metrics, config)
}

/// Innermost first: CORS, transport, panic boundary, counters. `track` sits
/// outside the panic boundary and the timeout so their 500 and 408 count as errors.
fn with_outer_layers(router: Router, metrics: Arc<Metrics>, config: &Config) -> Router {
    let router = cors::apply(router, config);
    let router = http::apply(router, config.request_timeout);

    router
        .layer(panics::layer(metrics.clone()))
        .layer(from_fn_with_state(metrics, track))
}

pub fn build_debug_router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/debug/metrics", get(debug::metrics))
        .route("/debug/liveness", get(liveness))
        .with_state(metrics)
}
