//! Bearer token authentication
//!
//! Tokens are HS256 JWTs whose `sub` claim is the acting user's UUID. The
//! user id is recorded on activities and as the creator of issued policies.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::UserId;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The acting user named by `sub`
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        Uuid::parse_str(&self.sub)
            .map(UserId::from_uuid)
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Signs a token for `user_id` valid for `expiration_secs`
pub fn create_token(
    user_id: UserId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let lifetime = i64::try_from(expiration_secs).map_err(|_| AuthError::InvalidToken)?;
    let exp = now + Duration::seconds(lifetime);

    let claims = Claims {
        sub: user_id.as_uuid().to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Verifies signature and expiry, then checks the subject is a user id
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    token_data.claims.user_id()?;
    Ok(token_data.claims)
}
