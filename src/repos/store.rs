//! Ownership lookup used by the resource loader middleware.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::RepoError;

/// A domain row that belongs to a user.
pub trait OwnedResource: Clone + Send + Sync + 'static {
    /// Resource name used in logs and error bodies ("home", "product", ...).
    const NAME: &'static str;
    /// Route parameter carrying the resource id ("home_id", ...).
    const PATH_PARAM: &'static str;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
}

/// Fetch one resource by id. `Ok(None)` when it does not exist.
#[async_trait]
pub trait ResourceStore<T>: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Option<T>, RepoError>;
}

/// Postgres-backed store; each resource's repo provides the `ResourceStore` impl.
pub struct PgStore<T> {
    pub(crate) db: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PgStore<T> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for PgStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

impl<T> std::fmt::Debug for PgStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore")
            .field("resource", &std::any::type_name::<T>())
            .finish()
    }
}
