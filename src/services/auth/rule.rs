//! Authorization rules.
//!
//! `authorize` is a pure function of (claims, owner id, rule): no I/O and no
//! state, so the same inputs always give the same decision.

use std::fmt;

use uuid::Uuid;

use super::claims::{Claims, Role};
use super::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Any authenticated caller.
    Any,
    /// Caller holds the `user` role.
    UserOnly,
    /// Caller holds the `admin` role.
    AdminOnly,
    /// Caller holds `admin`, or is the owner of the loaded resource.
    AdminOrSubject,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Any => "rule_any",
            Rule::UserOnly => "rule_user_only",
            Rule::AdminOnly => "rule_admin_only",
            Rule::AdminOrSubject => "rule_admin_or_subject",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decide whether `claims` satisfies `rule` for a resource owned by `owner_id`.
///
/// `owner_id` is `None` when the route carries no resource id. The admin role
/// always satisfies `AdminOrSubject`, whatever the owner.
pub fn authorize(claims: &Claims, owner_id: Option<Uuid>, rule: Rule) -> Result<(), AuthError> {
    match rule {
        Rule::Any => Ok(()),
        Rule::UserOnly if claims.has_role(Role::User) => Ok(()),
        Rule::AdminOnly if claims.is_admin() => Ok(()),
        Rule::UserOnly | Rule::AdminOnly => Err(AuthError::Denied { rule }),
        Rule::AdminOrSubject => {
            if claims.is_admin() || owner_id == Some(claims.subject) {
                Ok(())
            } else {
                Err(AuthError::NotOwner { rule })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(roles: &[Role]) -> Claims {
        Claims::new(Uuid::new_v4(), roles.iter().copied())
    }

    #[test]
    fn any_allows_every_authenticated_caller() {
        assert!(authorize(&claims(&[]), None, Rule::Any).is_ok());
        assert!(authorize(&claims(&[Role::User]), Some(Uuid::new_v4()), Rule::Any).is_ok());
    }

    #[test]
    fn user_only_requires_user_role() {
        assert!(authorize(&claims(&[Role::User]), None, Rule::UserOnly).is_ok());
        assert!(matches!(
            authorize(&claims(&[Role::Admin]), None, Rule::UserOnly),
            Err(AuthError::Denied { rule: Rule::UserOnly })
        ));
    }

    #[test]
    fn admin_only_ignores_ownership() {
        let user = claims(&[Role::User]);
        assert!(matches!(
            authorize(&user, Some(user.subject), Rule::AdminOnly),
            Err(AuthError::Denied { .. })
        ));
        assert!(authorize(&claims(&[Role::Admin]), Some(Uuid::new_v4()), Rule::AdminOnly).is_ok());
    }

    #[test]
    fn admin_or_subject_allows_owner() {
        let user = claims(&[Role::User]);
        assert!(authorize(&user, Some(user.subject), Rule::AdminOrSubject).is_ok());
    }

    #[test]
    fn admin_or_subject_denies_other_owner() {
        let user = claims(&[Role::User]);
        assert!(matches!(
            authorize(&user, Some(Uuid::new_v4()), Rule::AdminOrSubject),
            Err(AuthError::NotOwner { .. })
        ));
        assert!(matches!(
            authorize(&user, None, Rule::AdminOrSubject),
            Err(AuthError::NotOwner { .. })
        ));
    }

    #[test]
    fn admin_role_overrides_identity_mismatch() {
        let admin = claims(&[Role::Admin]);
        for owner in [None, Some(Uuid::new_v4()), Some(admin.subject)] {
            assert!(authorize(&admin, owner, Rule::AdminOrSubject).is_ok());
        }
    }

    #[test]
    fn decisions_are_repeatable() {
        let user = claims(&[Role::User]);
        let owner = Some(Uuid::new_v4());
        for rule in [Rule::Any, Rule::UserOnly, Rule::AdminOnly, Rule::AdminOrSubject] {
            let first = authorize(&user, owner, rule).is_ok();
            let second = authorize(&user, owner, rule).is_ok();
            assert_eq!(first, second, "{rule}");
        }
    }
}
