use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{auth::jwt::JwtKeys, error::AppError, state::AppState, users::repo_types::User};

/// Bearer-token gate: validates the JWT and resolves the user it names.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("No token, authorization denied"))?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::unauthorized("Token is not valid")
        })?;

        let user = state
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %claims.sub, "user lookup failed during auth");
                AppError::unauthorized("Token is not valid")
            })?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                AppError::unauthorized("Token is not valid")
            })?;

        Ok(AuthUser(user))
    }
}
