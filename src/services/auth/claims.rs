//! Token claims: the wire shape and the verified, typed identity.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Case-insensitive; unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT payload as signed by the token service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Identity asserted by a verified token. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: Uuid,
    pub issuer: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub roles: BTreeSet<Role>,
}

impl Claims {
    pub fn new(subject: Uuid, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            subject,
            issuer: String::new(),
            issued_at: None,
            expires_at: None,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl TryFrom<TokenClaims> for Claims {
    type Error = AuthError;

    fn try_from(token: TokenClaims) -> Result<Self, Self::Error> {
        if token.sub.trim().is_empty() {
            return Err(AuthError::EmptySubject);
        }
        let subject = Uuid::parse_str(&token.sub).map_err(|_| AuthError::InvalidSubject)?;

        let roles = token
            .roles
            .iter()
            .filter_map(|tag| {
                let role = Role::parse(tag);
                if role.is_none() {
                    tracing::debug!(tag = %tag, "ignoring unknown role tag");
                }
                role
            })
            .collect();

        Ok(Self {
            subject,
            issuer: token.iss,
            issued_at: DateTime::from_timestamp(token.iat, 0),
            expires_at: DateTime::from_timestamp(token.exp, 0),
            roles,
        })
    }
}
