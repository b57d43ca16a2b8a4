/*
 * Responsibility
 * - Token verification / issuance (EdDSA JWT)
 * - Typed claims and roles
 * - Authorization rules (pure)
 * - Password hashing for the token endpoint and admin tooling
 */
pub mod access_jwt;
pub mod claims;
pub mod error;
pub mod password;
pub mod rule;

#[cfg(test)]
pub mod test_keys;

pub use access_jwt::{AuthService, TokenSettings};
pub use claims::{Claims, Role, TokenClaims};
pub use error::AuthError;
pub use rule::{Rule, authorize};
