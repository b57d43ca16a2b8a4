/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Unify RepoError / AuthError / validation errors into one type
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// Marker placed on every response built from an `AppError`.
///
/// Outer layers (metrics, transaction) read it to learn that the handler chain
/// reported a failure.
#[derive(Debug, Clone, Copy)]
pub struct ReportedError {
    pub status: StatusCode,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    // A resource loader could not find the id named in the path. Answered
    // with 204 rather than 404 to keep the existing client contract.
    #[error("{resource} not found")]
    ResourceMissing { resource: &'static str },
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn field(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self::validation("data validation error", vec![FieldError::new(field, error)])
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ResourceMissing { .. } => StatusCode::NO_CONTENT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut response = if status == StatusCode::NO_CONTENT {
            // 204 must not carry a body
            status.into_response()
        } else {
            let (code, message, fields) = match self {
                AppError::Validation { message, fields } => ("VALIDATION", message, fields),
                AppError::BadRequest { code, message } => (code, message, Vec::new()),
                AppError::Unauthorized => ("UNAUTHORIZED", "unauthorized".into(), Vec::new()),
                AppError::Forbidden => ("FORBIDDEN", "forbidden".into(), Vec::new()),
                AppError::NotFound { resource } => {
                    ("NOT_FOUND", format!("{resource} not found."), Vec::new())
                }
                AppError::Conflict(message) => ("CONFLICT", message, Vec::new()),
                AppError::ResourceMissing { .. } | AppError::Internal => (
                    "INTERNAL_SERVER_ERROR",
                    "internal server error".into(),
                    Vec::new(),
                ),
            };

            let body = ErrorResponse {
                error: ErrorBody {
                    code,
                    message,
                    fields,
                },
            };
            (status, Json(body)).into_response()
        };

        response.extensions_mut().insert(ReportedError { status });
        response
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(what) => AppError::Conflict(what),
            RepoError::Db(err) => {
                tracing::error!(error = ?err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match &e {
            AuthError::NotOwner { .. } => AppError::Forbidden,
            AuthError::InvalidKey(_) | AuthError::SigningUnavailable | AuthError::Signing(_) => {
                tracing::error!(error = %e, "token service failure");
                AppError::Internal
            }
            _ => AppError::Unauthorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::Rule;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_lists_fields() {
        let response = AppError::field("orderBy", "order field does not exist").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ReportedError>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION");
        assert_eq!(body["error"]["fields"][0]["field"], "orderBy");
    }

    #[tokio::test]
    async fn auth_detail_is_not_exposed() {
        let response = AppError::from(AuthError::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "unauthorized");
    }

    #[test]
    fn ownership_denial_is_forbidden_and_role_denial_is_unauthorized() {
        let not_owner = AppError::from(AuthError::NotOwner {
            rule: Rule::AdminOrSubject,
        });
        let denied = AppError::from(AuthError::Denied {
            rule: Rule::AdminOnly,
        });

        assert_eq!(not_owner.status(), StatusCode::FORBIDDEN);
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_resource_is_an_empty_no_content() {
        let response = AppError::ResourceMissing { resource: "home" }.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.extensions().get::<ReportedError>().is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }
}
