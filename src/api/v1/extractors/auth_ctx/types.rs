/*
 * Responsibility
 * - The authenticated context a handler sees
 * - Inserted into request extensions by the authenticate middleware; handlers only
 *   ever receive this type
 *
 * Notes
 * - Token verification lives in services::auth, not here
 */

use uuid::Uuid;

use crate::services::auth::{Claims, Role};

/// Context attached to every authenticated request.
///
/// - `user_id` is the token subject, already parsed as a UUID
/// - `claims` is the full verified token; rule checks read its roles
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self {
            user_id: claims.subject,
            claims,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.claims.has_role(role)
    }
}
