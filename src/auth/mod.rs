use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT payload. `id` is the caller's user id and scopes every notes query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: i64, usuario: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            usuario,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Every way a bearer token can be rejected, in the order they are checked
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Token not provided")]
    Missing,

    #[error("Invalid token format (expected: Bearer <token>)")]
    Malformed,

    #[error("Server misconfigured")]
    SecretNotConfigured,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid(String),

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Pull the token out of an `Authorization` header value.
///
/// The header must be exactly two space-separated parts and the scheme must be
/// `bearer` in any casing.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header.ok_or(TokenError::Missing)?;

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") || parts[1].is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(parts[1])
}

/// Decode and verify a token against the server secret
pub fn validate_jwt(token: &str, secret: Option<&str>) -> Result<Claims, TokenError> {
    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(TokenError::SecretNotConfigured)?;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::SecretNotConfigured);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}
