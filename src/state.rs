/*
 * Responsibility
 * - Shared context bound to the routers (AppState)
 *   - db: PgPool, auth: AuthService, metrics: request counters
 * - Cheap to clone (Arc / pool handle inside)
 */
use std::sync::Arc;

use crate::middleware::metrics::Metrics;
use crate::services::auth::AuthService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub auth: Arc<AuthService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, auth: Arc<AuthService>, metrics: Arc<Metrics>) -> Self {
        Self { db, auth, metrics }
    }
}
