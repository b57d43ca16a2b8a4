//! Resource loader step: fetch the resource named by the route's id segment
//! before authorization runs.
//!
//! One generic middleware serves users, products and homes. It reads
//! `T::PATH_PARAM` from the matched route, loads the row through a
//! `ResourceStore<T>`, and records both `Loaded<T>` (for handlers) and its
//! `ResourceOwner` (for the authorize step).

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{RawPathParams, State, rejection::RawPathParamsRejection},
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::v1::extractors::{Loaded, ResourceOwner};
use crate::error::AppError;
use crate::repos::store::{OwnedResource, ResourceStore};

pub struct ResourceLoader<T> {
    store: Arc<dyn ResourceStore<T>>,
}

impl<T> ResourceLoader<T> {
    pub fn new<S>(store: S) -> Self
    where
        S: ResourceStore<T> + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<T> Clone for ResourceLoader<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn path_id(params: &RawPathParams, name: &str) -> Option<String> {
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub async fn load_resource<T: OwnedResource>(
    State(loader): State<ResourceLoader<T>>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw_id = match params {
        Ok(params) => path_id(&params, T::PATH_PARAM),
        Err(_) => None,
    };

    // Route without an id segment: nothing to load, no owner recorded.
    let Some(raw_id) = raw_id else {
        return Ok(next.run(req).await);
    };

    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::field(T::PATH_PARAM, "ID is not in its proper form"))?;

    let resource = match loader.store.fetch(id).await {
        Ok(Some(resource)) => resource,
        Ok(None) => {
            tracing::info!(resource = T::NAME, %id, "resource not found");
            return Err(AppError::ResourceMissing { resource: T::NAME });
        }
        Err(err) => {
            tracing::error!(resource = T::NAME, %id, error = ?err, "resource lookup failed");
            return Err(AppError::Internal);
        }
    };

    let loaded = Loaded::new(resource);
    req.extensions_mut().insert(ResourceOwner {
        resource: T::NAME,
        owner_id: loaded.owner_id,
    });
    req.extensions_mut().insert(loaded);

    Ok(next.run(req).await)
}


#[cfg(test)]
mod tests {
    use super::fakes::{MemoryStore, Thing};
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn show(loaded: Loaded<Thing>) -> String {
        format!("{}:{}", loaded.resource.id, loaded.owner_id)
    }

    fn app(store: MemoryStore) -> Router {
        Router::new()
            .route("/things/{thing_id}", get(show))
            .route_layer(middleware::from_fn_with_state(
                ResourceLoader::new(store),
                load_resource::<Thing>,
            ))
    }

    async fn get_status(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn loaded_resource_reaches_the_handler() {
        let thing = Thing {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
        };
        let (status, body) = get_status(
            app(MemoryStore::with([thing.clone()])),
            &format!("/things/{}", thing.id),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{}:{}", thing.id, thing.owner));
    }

    #[tokio::test]
    async fn unknown_id_is_no_content() {
        let (status, body) = get_status(
            app(MemoryStore::default()),
            &format!("/things/{}", Uuid::new_v4()),
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let (status, body) = get_status(app(MemoryStore::default()), "/things/not-a-uuid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("thing_id"));
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let store = MemoryStore {
            broken: true,
            ..Default::default()
        };
        let (status, _) = get_status(app(store), &format!("/things/{}", Uuid::new_v4())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
