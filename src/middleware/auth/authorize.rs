//! Authorize step: evaluate a route's `Rule` against the caller and, when a
//! loader ran before it, the loaded resource's owner.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::api::v1::extractors::{AuthCtx, ResourceOwner};
use crate::error::AppError;
use crate::services::auth::{Rule, authorize as check};

/// Mount with `from_fn_with_state(rule, authorize)`.
pub async fn authorize(
    State(rule): State<Rule>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ctx) = req.extensions().get::<AuthCtx>() else {
        // authenticate must run first; treat a misordered chain as unauthenticated
        tracing::error!(%rule, "authorize ran without an authenticated context");
        return Err(AppError::Unauthorized);
    };
    let owner = req.extensions().get::<ResourceOwner>().copied();

    if let Err(err) = check(&ctx.claims, owner.map(|o| o.owner_id), rule) {
        tracing::warn!(
            error = %err,
            user_id = %ctx.user_id,
            resource = owner.map(|o| o.resource).unwrap_or("-"),
            "authorization denied"
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::services::auth::{Claims, Role};

    // Stands in for authenticate + loader so the rule is tested in isolation.
    async fn seed(
        State((claims, owner)): State<(Option<Claims>, Option<Uuid>)>,
        mut req: Request<Body>,
        next: Next,
    ) -> Response {
        if let Some(claims) = claims {
            req.extensions_mut().insert(AuthCtx::new(claims));
        }
        if let Some(owner_id) = owner {
            req.extensions_mut().insert(ResourceOwner {
                resource: "thing",
                owner_id,
            });
        }
        next.run(req).await
    }

    async fn status(rule: Rule, claims: Option<Claims>, owner: Option<Uuid>) -> StatusCode {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(rule, authorize))
            .layer(middleware::from_fn_with_state((claims, owner), seed));

        app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn subject_owning_the_resource_is_allowed() {
        let me = Uuid::new_v4();
        let claims = Claims::new(me, [Role::User]);
        assert_eq!(
            status(Rule::AdminOrSubject, Some(claims), Some(me)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn someone_elses_resource_is_forbidden() {
        let claims = Claims::new(Uuid::new_v4(), [Role::User]);
        assert_eq!(
            status(Rule::AdminOrSubject, Some(claims), Some(Uuid::new_v4())).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn admin_passes_whatever_the_owner() {
        let claims = Claims::new(Uuid::new_v4(), [Role::Admin]);
        assert_eq!(
            status(Rule::AdminOrSubject, Some(claims), Some(Uuid::new_v4())).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn role_rules_deny_with_unauthorized() {
        let user = Claims::new(Uuid::new_v4(), [Role::User]);
        let admin = Claims::new(Uuid::new_v4(), [Role::Admin]);

        assert_eq!(
            status(Rule::AdminOnly, Some(user.clone()), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(Rule::UserOnly, Some(admin), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(Rule::Any, Some(user), None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_context_is_unauthorized() {
        assert_eq!(status(Rule::Any, None, None).await, StatusCode::UNAUTHORIZED);
    }
}
