use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::ApiError, state::AppState, users::repo_types::User};

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("invalid auth scheme".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token.trim()).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            ApiError::Unauthorized("invalid or expired token".into())
        })?;

        Ok(AuthUser(claims.sub))
    }
}

/// The token's user, loaded and still active. A deactivated account loses
/// access at once, not when its token expires.
pub struct ActiveUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let found = User::find_by_id(&state.db, user_id).await?;
        require_active(user_id, found).map(ActiveUser)
    }
}

fn require_active(user_id: Uuid, found: Option<User>) -> Result<User, ApiError> {
    match found {
        Some(user) if user.active => Ok(user),
        Some(_) => {
            warn!(%user_id, "token of a deactivated user");
            Err(ApiError::Unauthorized("user not found or inactive".into()))
        }
        None => {
            warn!(%user_id, "token of an unknown user");
            Err(ApiError::Unauthorized("user not found or inactive".into()))
        }
    }
}

/// An authenticated, active user with the admin flag set.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ActiveUser(user) = ActiveUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "admin route refused for non-admin");
            return Err(ApiError::Forbidden("admin privileges required".into()));
        }
        Ok(AdminUser(user))
    }
}
