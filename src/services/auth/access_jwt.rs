use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::claims::{Claims, Role, TokenClaims};
use super::error::AuthError;
use crate::config::Config;

/// Settings the token service is built from.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub public_key_pem: String,
    pub private_key_pem: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub kid: String,
    pub leeway_seconds: u64,
    pub ttl_seconds: u64,
}

impl From<&Config> for TokenSettings {
    fn from(config: &Config) -> Self {
        Self {
            public_key_pem: config.access_jwt_public_key_pem.clone(),
            private_key_pem: config.access_jwt_private_key_pem.clone(),
            issuer: config.auth_issuer.clone(),
            audience: config.auth_audience.clone(),
            kid: config.auth_active_kid.clone(),
            leeway_seconds: config.access_token_leeway_seconds,
            ttl_seconds: config.access_token_ttl_seconds,
        }
    }
}

#[derive(Clone)]
struct Signer {
    encoding_key: EncodingKey,
    kid: String,
    ttl_seconds: u64,
}

/// EdDSA (Ed25519) access-token verifier, and signer when a private key is configured.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    signer: Option<Signer>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("can_sign", &self.signer.is_some())
            .finish()
    }
}

impl AuthService {
    pub fn new(settings: &TokenSettings) -> Result<Self, AuthError> {
        let decoding_key = DecodingKey::from_ed_pem(settings.public_key_pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(format!("ed25519 public key pem: {e}")))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = settings.leeway_seconds;

        let signer = match settings.private_key_pem.as_deref() {
            Some(pem) => Some(Signer {
                encoding_key: EncodingKey::from_ed_pem(pem.as_bytes()).map_err(|e| {
                    AuthError::InvalidKey(format!("ed25519 private key pem: {e}"))
                })?,
                kid: settings.kid.clone(),
                ttl_seconds: settings.ttl_seconds,
            }),
            None => None,
        };

        Ok(Self {
            decoding_key,
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            signer,
        })
    }

    /// Verify the raw `Authorization` header value and return the caller's claims.
    ///
    /// Fails when the header is absent or malformed, the signature or
    /// iss/aud/exp checks fail, or the subject is empty / not a UUID.
    pub fn authenticate(&self, header_value: Option<&str>) -> Result<Claims, AuthError> {
        let header_value = header_value.ok_or(AuthError::MissingHeader)?;
        let token = bearer_token(header_value)?;
        self.verify(token)
    }

    /// Verify a compact JWT and convert it into typed claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;

        Claims::try_from(data.claims)
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    /// Key id placed in the header of issued tokens.
    pub fn signing_kid(&self) -> Option<&str> {
        self.signer.as_ref().map(|s| s.kid.as_str())
    }

    /// Issue a signed access token for `subject`.
    pub fn issue(&self, subject: Uuid, roles: &[Role]) -> Result<String, AuthError> {
        let signer = self.signer.as_ref().ok_or(AuthError::SigningUnavailable)?;

        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            iat: now,
            exp: now + signer.ttl_seconds as i64,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };

        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        header.kid = Some(signer.kid.clone());

        jsonwebtoken::encode(&header, &claims, &signer.encoding_key).map_err(AuthError::Signing)
    }
}

fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header_value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_keys;

    #[test]
    fn issued_token_round_trips_subject_and_roles() {
        let auth = test_keys::auth_service();
        let id = Uuid::new_v4();
        let token = auth.issue(id, &[Role::User]).unwrap();

        let claims = auth
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(claims.subject, id);
        assert!(claims.has_role(Role::User));
        assert_eq!(claims.issuer, test_keys::ISSUER);
    }

    #[test]
    fn header_must_be_bearer() {
        let auth = test_keys::auth_service();
        let token = auth.issue(Uuid::new_v4(), &[]).unwrap();

        assert!(matches!(auth.authenticate(None), Err(AuthError::MissingHeader)));
        assert!(matches!(
            auth.authenticate(Some(&format!("Basic {token}"))),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            auth.authenticate(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(auth.authenticate(Some(&format!("bearer {token}"))).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = test_keys::auth_service();
        let now = Utc::now().timestamp();
        let token = test_keys::sign(&TokenClaims {
            iss: test_keys::ISSUER.into(),
            aud: test_keys::AUDIENCE.into(),
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            roles: vec!["user".into()],
        });

        assert!(matches!(auth.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let auth = test_keys::auth_service();
        let token = test_keys::sign_with_foreign_key(Uuid::new_v4());

        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let auth = test_keys::auth_service();
        let now = Utc::now().timestamp();
        let token = test_keys::sign(&TokenClaims {
            iss: test_keys::ISSUER.into(),
            aud: "someone-else".into(),
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 600,
            roles: vec![],
        });

        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let auth = test_keys::auth_service();
        let now = Utc::now().timestamp();
        let token = test_keys::sign(&TokenClaims {
            iss: test_keys::ISSUER.into(),
            aud: test_keys::AUDIENCE.into(),
            sub: "alice".into(),
            iat: now,
            exp: now + 600,
            roles: vec![],
        });

        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidSubject)));
    }

    #[test]
    fn verifier_without_private_key_cannot_sign() {
        let mut settings = test_keys::settings();
        settings.private_key_pem = None;
        let auth = AuthService::new(&settings).unwrap();

        assert!(!auth.can_sign());
        assert!(matches!(
            auth.issue(Uuid::new_v4(), &[Role::Admin]),
            Err(AuthError::SigningUnavailable)
        ));
    }
}
