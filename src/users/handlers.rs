use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{MessageResponse, RegisterRequest, RegisteredUser, UpdateUserRequest, UserListItem},
    repo_types::{NewUser, User},
    services::{
        duplicate_field_message, normalize_registration, normalize_update, validate_registration,
    },
};
use crate::{
    auth::{extractors::AdminUser, password::hash_password},
    bookings,
    db::unique_violation,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn register_routes() -> Router<AppState> {
    Router::new().route("/usuarios/crear", post(register))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/usuarios", get(list_users))
        .route("/api/usuarios/:id", put(update_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let payload = normalize_registration(payload);
    if let Err(e) = validate_registration(&payload) {
        warn!(error = %e, "registration rejected");
        return Err(e);
    }

    let new = NewUser {
        password_hash: hash_password(&payload.password)?,
        name: payload.name,
        surname: payload.surname,
        dni: payload.dni,
        cuil_cuit: payload.cuil_cuit,
        email: payload.email,
        phone: payload.phone,
        guests: payload.guests,
    };

    let user = match User::create(&state.db, &new).await {
        Ok(u) => u,
        Err(e) => {
            if let Some(constraint) = unique_violation(&e) {
                warn!(%constraint, "duplicate registration");
                return Err(ApiError::Conflict(duplicate_field_message(&constraint).into()));
            }
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(RegisteredUser::from(user))))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<UserListItem>>> {
    let users = User::list_active(&state.db).await?;
    info!(count = users.len(), "user list requested");
    Ok(Json(users.into_iter().map(UserListItem::from).collect()))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserListItem>> {
    let payload = normalize_update(payload)?;

    if User::find_active(&state.db, id).await?.is_none() {
        warn!(user_id = %id, "update of missing or inactive user");
        return Err(ApiError::NotFound("user not found".into()));
    }
    if User::email_taken_by_other(&state.db, &payload.email, id).await? {
        return Err(ApiError::Conflict("email already in use by another user".into()));
    }

    let updated = match User::update_profile(
        &state.db,
        id,
        &payload.name,
        &payload.surname,
        &payload.email,
    )
    .await
    {
        Ok(Some(u)) => u,
        Ok(None) => return Err(ApiError::NotFound("user not found".into())),
        Err(e) if unique_violation(&e).is_some() => {
            return Err(ApiError::Conflict("email already in use by another user".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(admin_id = %admin.0.id, user_id = %id, "user updated");
    Ok(Json(UserListItem::from(updated)))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let user = User::find_active(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let active = bookings::repo::count_active_for_user(&state.db, id).await?;
    if active > 0 {
        warn!(
            user_id = %id,
            active_bookings = active,
            "refusing to delete user with active bookings"
        );
        return Err(ApiError::BadRequest(
            "cannot delete a user with active bookings".into(),
        ));
    }

    if !User::deactivate(&state.db, id).await? {
        return Err(ApiError::NotFound("user not found".into()));
    }

    info!(admin_id = %admin.0.id, user_id = %id, "user deactivated");
    Ok(Json(MessageResponse {
        message: format!("user {} {} deleted", user.name, user.surname),
    }))
}
