use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::resolver::resolve_current_user;
use crate::{error::ApiError, state::AppState, users::repo_types::User};

/// The active user behind the request's bearer token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid auth scheme".into()))?;

        let user = resolve_current_user(
            &state.keys,
            state.clock.as_ref(),
            state.users.as_ref(),
            token.trim(),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "bearer token refused");
            ApiError::from(e)
        })?;

        Ok(CurrentUser(user))
    }
}
