use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_JWT_EXPIRY_HOURS;
use crate::database::models::{Role, UserProfile};

pub mod password;

pub use password::{hash_password, verify_password, PasswordError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &UserProfile, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry and return the claims.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}
