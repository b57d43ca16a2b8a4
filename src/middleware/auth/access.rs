//! Authenticate step: verify the bearer access token and put `AuthCtx` into the
//! request extensions.
//!
//! Mounted with `from_fn_with_state`, the state being the shared `AuthService`.
//! Nothing is inserted when verification fails, so later steps never see a
//! half-authenticated request.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthService;

pub async fn authenticate(
    State(auth): State<Arc<AuthService>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = match auth.authenticate(header_value) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                error = %err,
                method = %req.method(),
                path = %req.uri().path(),
                "authentication failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(user_id = %claims.subject, "authenticated");

    // middleware -> extractor hand-off
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::api::v1::extractors::AuthCtxExtractor;
    use crate::services::auth::{Role, TokenClaims, test_keys};

    async fn whoami(AuthCtxExtractor(ctx): AuthCtxExtractor) -> String {
        format!("{}:{}", ctx.user_id, ctx.is_admin())
    }

    fn app() -> Router {
        Router::new().route("/me", get(whoami)).layer(middleware::from_fn_with_state(
            test_keys::shared_auth_service(),
            authenticate,
        ))
    }

    async fn call(authorization: Option<String>) -> Response {
        let mut builder = Request::builder().uri("/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn valid_token_exposes_subject_to_handler() {
        let subject = Uuid::new_v4();
        let response = call(Some(test_keys::bearer(subject, &[Role::Admin]))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, format!("{subject}:true"));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let response = call(None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let token = test_keys::auth_service()
            .issue(Uuid::new_v4(), &[Role::User])
            .unwrap();
        let response = call(Some(format!("Basic {token}"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let now = chrono::Utc::now().timestamp();
        let token = test_keys::sign(&TokenClaims {
            iss: test_keys::ISSUER.into(),
            aud: test_keys::AUDIENCE.into(),
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            roles: vec!["user".into()],
        });
        let response = call(Some(format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_from_another_key_is_unauthorized() {
        let token = test_keys::sign_with_foreign_key(Uuid::new_v4());
        let response = call(Some(format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
