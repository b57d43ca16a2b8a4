//! Transaction scoping.
//!
//! Begins a transaction, hands it to the rest of the chain through the request
//! extensions, and ends it exactly once:
//!
//! - success response: commit
//! - error response (status >= 400 or an `AppError` marker): rollback
//! - panic: rollback, then the panic continues to the panic boundary
//! - future dropped (timeout, client gone): rollback from the drop guard
//!
//! Ending an already ended transaction reports `TxError::Done`; during
//! rollback that is not an error.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use thiserror::Error;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{AppError, ReportedError};

#[derive(Debug, Error)]
pub enum TxError {
    #[error("transaction already committed or rolled back")]
    Done,
    #[error("transaction db error")]
    Db(#[from] sqlx::Error),
}

impl From<TxError> for AppError {
    fn from(e: TxError) -> Self {
        tracing::error!(error = ?e, "transaction failure");
        AppError::Internal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    NotStarted,
    Began,
    Committed,
    RolledBack,
}

#[async_trait]
pub trait Transactional: Clone + Send + Sync + 'static {
    async fn commit(&self) -> Result<(), TxError>;
    async fn rollback(&self) -> Result<(), TxError>;
}

#[async_trait]
pub trait Beginner: Clone + Send + Sync + 'static {
    type Tx: Transactional;

    async fn begin(&self) -> Result<Self::Tx, TxError>;
}

#[derive(Clone, Debug)]
pub struct PgBeginner {
    pool: PgPool,
}

impl PgBeginner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Beginner for PgBeginner {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, TxError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }
}

/// Request-scoped Postgres transaction; clones share the same transaction.
#[derive(Clone)]
pub struct PgTx {
    inner: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl std::fmt::Debug for PgTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTx").finish_non_exhaustive()
    }
}

impl PgTx {
    /// Connection of the open transaction, for use as a repo executor:
    /// `user_repo::create(&mut *tx.conn().await?, ..)`.
    pub async fn conn(&self) -> Result<MappedMutexGuard<'_, PgConnection>, TxError> {
        let guard = self.inner.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_deref_mut()).map_err(|_| TxError::Done)
    }
}

#[async_trait]
impl Transactional for PgTx {
    async fn commit(&self) -> Result<(), TxError> {
        let tx = self.inner.lock().await.take().ok_or(TxError::Done)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), TxError> {
        let tx = self.inner.lock().await.take().ok_or(TxError::Done)?;
        tx.rollback().await?;
        Ok(())
    }
}

/// Tracks the state machine and rolls back if dropped before a terminal state.
struct TxScope<T: Transactional> {
    tx: T,
    state: TxState,
}

impl<T: Transactional> TxScope<T> {
    fn began(tx: T) -> Self {
        Self {
            tx,
            state: TxState::Began,
        }
    }

    async fn commit(&mut self) -> Result<(), TxError> {
        let result = self.tx.commit().await;
        if result.is_ok() {
            self.state = TxState::Committed;
        }
        result
    }

    async fn rollback(&mut self) {
        match self.tx.rollback().await {
            Ok(()) | Err(TxError::Done) => {}
            Err(err) => tracing::error!(error = ?err, "transaction rollback failed"),
        }
        self.state = TxState::RolledBack;
    }
}

impl<T: Transactional> Drop for TxScope<T> {
    fn drop(&mut self) {
        if self.state != TxState::Began {
            return;
        }
        tracing::warn!("request ended before its transaction did; rolling back");
        let tx = self.tx.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                match tx.rollback().await {
                    Ok(()) | Err(TxError::Done) => {}
                    Err(err) => tracing::error!(error = ?err, "transaction rollback failed"),
                }
            });
        }
    }
}

fn reported_failure(response: &Response) -> bool {
    response.extensions().get::<ReportedError>().is_some()
        || response.status().is_client_error()
        || response.status().is_server_error()
}

/// Mount with `from_fn_with_state(beginner, transaction::<B>)`.
pub async fn transaction<B: Beginner>(
    State(beginner): State<B>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let tx = beginner.begin().await?;
    req.extensions_mut().insert(tx.clone());
    let mut scope = TxScope::began(tx);

    let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            scope.rollback().await;
            std::panic::resume_unwind(panic);
        }
    };

    if reported_failure(&response) {
        tracing::debug!(status = %response.status(), "rolling back transaction");
        scope.rollback().await;
        return Ok(response);
    }

    if let Err(err) = scope.commit().await {
        tracing::error!(error = ?err, "transaction commit failed");
        scope.rollback().await;
        return Err(AppError::Internal);
    }

    Ok(response)
}
