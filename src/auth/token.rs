use crate::config::Config;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: Uuid,
    /// Unique token id, so two tokens issued in the same second still differ.
    pub jti: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Signing and verification keys for session tokens.
///
/// New tokens are always signed with the current secret. Verification also accepts
/// the previous secret, so a secret can be rotated without logging every user out
/// at once.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, previous_secret: Option<&str>, ttl_hours: i64) -> Self {
        let mut decoding = vec![DecodingKey::from_secret(secret.as_bytes())];
        if let Some(previous) = previous_secret {
            decoding.push(DecodingKey::from_secret(previous.as_bytes()));
        }
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_previous_secret.as_deref(),
            config.token_ttl_hours,
        )
    }

    /// Signs a new token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry of `token` and returns its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, expired, or signed
    /// with a secret that is neither current nor previous.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let mut last_error = None;

        for key in &self.decoding {
            match decode::<Claims>(token, key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => last_error = Some(e),
                Err(e) => return Err(e.into()),
            }
        }

        Err(match last_error {
            Some(e) => e.into(),
            None => AppError::Unauthorized("Invalid token".into()),
        })
    }
}
