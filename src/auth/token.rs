use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token lifetime: {0} hours")]
    InvalidExpiry(u64),
}

/// Why a presented token was refused. Always an authorization failure, never a server fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidToken {
    #[error("Missing authorization token")]
    Missing,

    #[error("Malformed authorization token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token has expired")]
    Expired,
}

/// Issues and verifies HS256 bearer tokens carrying a user id
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        let expiry = i64::try_from(expiry_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(Duration::try_hours)
            .filter(|expiry| Utc::now().checked_add_signed(*expiry).is_some())
            .ok_or(JwtError::InvalidExpiry(expiry_hours))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Decode and check signature and expiry, yielding the user id
    pub fn verify(&self, token: &str) -> Result<Uuid, InvalidToken> {
        if token.trim().is_empty() {
            return Err(InvalidToken::Missing);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => InvalidToken::Expired,
            ErrorKind::InvalidSignature => InvalidToken::BadSignature,
            _ => InvalidToken::Malformed,
        })?;

        debug!("Validated token for user {}", data.claims.sub);
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-12345", 24).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_user() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token), Ok(user_id));
    }

    #[test]
    fn expired_token_rejected() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens
            .sign(&Claims {
                sub: Uuid::new_v4(),
                iat: (now - Duration::hours(25)).timestamp(),
                exp: (now - Duration::hours(1)).timestamp(),
            })
            .unwrap();
        assert_eq!(tokens.verify(&token), Err(InvalidToken::Expired));
    }

    #[test]
    fn different_secret_rejected() {
        let other = TokenService::new("another-secret", 24).unwrap();
        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(service().verify(&token), Err(InvalidToken::BadSignature));
    }

    #[test]
    fn garbage_and_empty_rejected() {
        let tokens = service();
        assert_eq!(tokens.verify("invalid.token.here"), Err(InvalidToken::Malformed));
        assert_eq!(tokens.verify("not-a-jwt"), Err(InvalidToken::Malformed));
        assert_eq!(tokens.verify(""), Err(InvalidToken::Missing));
    }

    #[test]
    fn unrepresentable_lifetimes_refused() {
        for hours in [0, u64::MAX, i64::MAX as u64] {
            assert!(
                matches!(TokenService::new("secret", hours), Err(JwtError::InvalidExpiry(h)) if h == hours),
                "{hours}"
            );
        }
    }

    #[test]
    fn longest_configured_lifetime_still_verifies() {
        let tokens = TokenService::new("secret", crate::config::MAX_JWT_EXPIRY_HOURS).unwrap();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token), Ok(user_id));
    }

    #[test]
    fn empty_secret_refused() {
        assert!(matches!(TokenService::new("", 24), Err(JwtError::InvalidSecret)));
    }
}
