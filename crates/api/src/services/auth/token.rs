//! Session tokens.
//!
//! HS256 JWTs carrying the identity id and role, valid for seven days. There
//! is no refresh and no revocation; expiry is the only way a token stops
//! working.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use keik_core::{IdentityId, Role};

use super::AuthError;

/// How long an issued token stays valid.
pub const TOKEN_TTL: Duration = Duration::days(7);

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id, as a decimal string.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The verified caller behind a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub identity_id: IdentityId,
    pub role: Role,
}

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for a verified identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, identity_id: IdentityId, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + TOKEN_TTL).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenSigning)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is malformed, signed
    /// with another key, or expired.
    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::InvalidToken)?;
        let identity_id: IdentityId = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken(ErrorKind::InvalidSubject.into()))?;

        Ok(Session {
            identity_id,
            role: data.claims.role,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(secret))
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%");
        let token = issuer.issue(IdentityId::new(42), Role::Baker).unwrap();
        let session = issuer.verify(&token).unwrap();
        assert_eq!(session.identity_id, IdentityId::new(42));
        assert_eq!(session.role, Role::Baker);
    }

    #[test]
    fn test_rejects_other_key() {
        let token = issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%")
            .issue(IdentityId::new(1), Role::Admin)
            .unwrap();
        let result = issuer("Zq8!rT4#uV1$wX6%yA2^bC9&dE3*fG7@").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let issuer = issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%");
        let issued_at = Utc::now() - Duration::days(8);
        let claims = Claims {
            sub: "1".to_string(),
            role: Role::Customer,
            iat: issued_at.timestamp(),
            exp: (issued_at + TOKEN_TTL).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding).unwrap();
        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_subject_is_a_string_claim() {
        let issuer = issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%");
        let token = issuer.issue(IdentityId::new(7), Role::Customer).unwrap();
        let data = decode::<serde_json::Value>(&token, &issuer.decoding, &issuer.validation).unwrap();
        assert_eq!(data.claims["sub"], "7");
    }

    #[test]
    fn test_rejects_non_numeric_subject() {
        let issuer = issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%");
        let now = Utc::now();
        let claims = Claims {
            sub: "someone".to_string(),
            role: Role::Admin,
            iat: now.timestamp(),
            exp: (now + TOKEN_TTL).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding).unwrap();
        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(issuer("kP9#vR2$mX7!qL4@wN8&zT1*bY5^cH3%")
            .verify("not-a-token")
            .is_err());
    }
}
