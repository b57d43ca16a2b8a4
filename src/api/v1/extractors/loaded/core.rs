/*
 * Responsibility
 *  - The resource a loader middleware fetched for this request (Loaded<T>)
 *  - The type-erased owner id the authorize step reads (ResourceOwner)
 *  - impl FromRequestParts for Loaded<T>, so handlers reuse the row without a second read
 * Not here
 *  - Home / Product / User names (see types.rs)
 *  - the storage lookup itself (middleware::auth::resource)
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::store::OwnedResource;

/// Resource loaded from the id in the request path.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub resource: T,
    pub owner_id: Uuid,
}

impl<T: OwnedResource> Loaded<T> {
    pub fn new(resource: T) -> Self {
        let owner_id = resource.owner_id();
        Self { resource, owner_id }
    }

    pub fn into_inner(self) -> T {
        self.resource
    }
}

/// Owner of whatever resource the loader fetched. Authorize does not know `T`,
/// so the loader records the owner separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner {
    pub resource: &'static str,
    pub owner_id: Uuid,
}

impl<S, T> FromRequestParts<S> for Loaded<T>
where
    S: Send + Sync,
    T: OwnedResource,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Loaded<T>>() {
            Some(loaded) => Ok(loaded.clone()),
            None => {
                // A route that extracts Loaded<T> must sit behind load_resource::<T>.
                tracing::error!(resource = T::NAME, "resource loader did not run for route");
                Err(AppError::Internal)
            }
        }
    }
}
