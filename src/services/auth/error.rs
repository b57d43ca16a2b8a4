/*
 * Responsibility
 * - Authentication / authorization failures raised by the auth services
 * - Detail stays server-side; the HTTP boundary only sees 401 / 403
 */
use thiserror::Error;

use super::rule::Rule;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("expected authorization header format: Bearer <token>")]
    MalformedHeader,

    #[error("token verification failed: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("empty 'sub' claim")]
    EmptySubject,

    #[error("invalid 'sub' claim (expected UUID)")]
    InvalidSubject,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("token signing is not configured")]
    SigningUnavailable,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("rule[{rule}] not satisfied")]
    Denied { rule: Rule },

    #[error("rule[{rule}] not satisfied: caller is not the resource owner")]
    NotOwner { rule: Rule },
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidToken(e),
        }
    }
}
