use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest},
        extractors::ActiveUser,
        jwt::JwtKeys,
        password::verify_password,
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo_types::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}

fn issue_pair(keys: &JwtKeys, user: User) -> ApiResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        token_type: "bearer",
        user: PublicUser::from(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let dni = payload
        .dni
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let found = match (email.as_deref(), dni) {
        (Some(email), _) => User::find_by_email(&state.db, email).await?,
        (None, Some(dni)) => User::find_by_dni(&state.db, dni).await?,
        (None, None) => {
            return Err(ApiError::BadRequest("email or dni is required".into()));
        }
    };

    let Some(user) = found else {
        warn!(email = ?email, dni = ?dni, "login unknown account");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    };

    if !user.active {
        warn!(user_id = %user.id, "login attempt on inactive user");
        return Err(ApiError::Unauthorized("inactive user".into()));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("invalid or expired refresh token".into())
    })?;

    let user = User::find_active(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found or inactive".into()))?;

    Ok(Json(issue_pair(&keys, user)?))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(ActiveUser(user): ActiveUser) -> ApiResult<Json<PublicUser>> {
    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            surname: "García".into(),
            dni: "30123456".into(),
            cuil_cuit: None,
            email: "ana@example.com".into(),
            phone: "+54 11 5555 0000".into(),
            guests: 2,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            active: true,
            is_admin: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn auth_response_never_leaks_password_hash() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = sample_user();
        let id = user.id;
        let res = issue_pair(&keys, user).unwrap();

        assert_eq!(keys.verify_access(&res.access_token).unwrap().sub, id);
        assert_eq!(keys.verify_refresh(&res.refresh_token).unwrap().sub, id);

        let json = serde_json::to_string(&res).unwrap();
        assert!(json.contains("ana@example.com"));
        assert!(json.contains("\"token_type\":\"bearer\""));
        assert!(!json.contains("argon2"));
    }
}
