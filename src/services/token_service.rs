use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
    models::UserId,
};

/// Sign a bearer token for `user_id` valid for `ttl`.
pub fn issue_token(secret: &str, user_id: UserId, ttl: Duration) -> AppResult<String> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid token ttl: {e}")))?;
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Check signature and expiry, returning the embedded claims.
pub fn verify_token(secret: &str, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        AppError::Forbidden("Invalid or expired token".into())
    })?;

    Ok(decoded.claims)
}

pub fn user_id_from_claims(claims: &Claims) -> AppResult<UserId> {
    claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AppError::Forbidden("Invalid user id in token".into()))
}
