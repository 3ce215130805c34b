//! Bearer-token extractor for authenticated handlers.

use crate::{
    errors::AppError, models::user::UserIdentity, services::auth::AuthError, state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// The user behind the request's `Authorization: Bearer <token>` header.
pub struct CurrentUser(pub UserIdentity);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AuthError::Unauthenticated)?;

        state
            .auth
            .current_user(token)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("invalid or expired token"))
    }
}
