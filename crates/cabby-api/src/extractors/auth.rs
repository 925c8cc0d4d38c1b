//! `AuthUser` extractor: validates the bearer token and loads the caller.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cabby_core::error::AppError;
use cabby_entity::user::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, resolved to their user row.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl std::ops::Deref for AuthUser {
    type Target = User;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwt_decoder.decode(token)?;

        let user = state
            .users
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unknown user"))?;

        Ok(AuthUser(user))
    }
}
