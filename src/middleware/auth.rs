use axum::{extract::FromRequestParts, http::header};

use crate::{
    error::AppError,
    models::UserId,
    services::token_service::{user_id_from_claims, verify_token},
    state::AppState,
};

/// Caller identity established from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Reject a request acting on behalf of someone other than the caller.
pub fn ensure_caller(user: &AuthUser, user_id: UserId) -> Result<(), AppError> {
    if user.user_id != user_id {
        return Err(AppError::Forbidden(
            "user_id does not match the authenticated user".into(),
        ));
    }
    Ok(())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = verify_token(&state.config.jwt_secret, token)?;
        let user_id = user_id_from_claims(&claims)?;

        Ok(AuthUser { user_id })
    }
}
