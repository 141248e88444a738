//! Access token issuing and verification (HS256).
//!
//! ```ignore
//! use learnhub_auth::{TokenSubject, create_access_token, verify_token};
//!
//! let token = create_access_token(&subject, &config.jwt)?;
//! let claims = verify_token(&token, &config.jwt)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use learnhub_config::JwtConfig;
use learnhub_core::AppError;

use crate::claims::Claims;

/// Identity a token is issued for.
#[derive(Debug, Clone)]
pub struct TokenSubject<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub role: &'a str,
    pub email: &'a str,
}

pub fn create_access_token(
    subject: &TokenSubject<'_>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.lifetime_secs as usize;

    let claims = Claims {
        sub: subject.id.to_string(),
        name: subject.name.to_string(),
        role: subject.role.to_string(),
        email: subject.email.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies signature and expiry. Every failure is a 401.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))
}
