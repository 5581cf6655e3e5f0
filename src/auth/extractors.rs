use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    access,
    auth::jwt::JwtKeys,
    error::ApiError,
    state::AppState,
    users::repo::User,
};

/// Resolves the bearer token to an active user row.
///
/// Inactive accounts are indistinguishable from missing credentials for
/// every operation past login.
pub struct CurrentUser(pub User);

/// `CurrentUser` plus the superuser requirement.
pub struct CurrentSuperuser(pub User);

async fn resolve_user(parts: &mut Parts, state: &AppState) -> Result<User, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::Unauthenticated
    })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !user.is_active {
        warn!(user_id = %user.id, "inactive account presented a valid token");
        return Err(ApiError::Unauthenticated);
    }

    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_user(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSuperuser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        access::ensure_superuser(&user)?;
        Ok(CurrentSuperuser(user))
    }
}
