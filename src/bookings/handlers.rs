use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{AvailabilityQuery, AvailabilityResponse, CreateBookingRequest, UpdateStatusRequest},
    repo,
    repo_types::{Booking, BookingStatus},
    services::{
        check_transition, create_booking, ensure_capacity, nightly_availability, validate_range,
        validate_stay, TOTAL_ROOMS,
    },
};
use crate::{
    auth::extractors::{ActiveUser, AdminUser, AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo_types::User,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reservas", get(list_mine).post(create))
        .route("/api/reservas/pendientes", get(list_pending))
        .route("/api/reservas/:id", get(get_one))
        .route("/api/reservas/:id/estado", put(update_status))
        .route("/api/disponibilidad", get(availability))
}

/// Loads a booking the caller may see: their own, or any when they are an admin.
/// Other users' bookings are reported as missing.
pub(crate) async fn visible_booking(
    state: &AppState,
    user: &User,
    booking_id: Uuid,
) -> ApiResult<Booking> {
    let booking = repo::find(&state.db, booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    if may_view(booking.user_id, user) {
        Ok(booking)
    } else {
        Err(ApiError::NotFound("booking not found".into()))
    }
}

fn may_view(owner_id: Uuid, user: &User) -> bool {
    owner_id == user.id || user.is_admin
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_mine(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = repo::list_by_user(&state.db, user.id).await?;
    info!(count = bookings.len(), "user listed bookings");
    Ok(Json(bookings))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let today = OffsetDateTime::now_utc().date();
    let stay = validate_stay(&payload, today)?;

    let user = User::find_active(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let booking = create_booking(&state, user.id, &user.email, stay).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_one(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(visible_booking(&state, &user, id).await?))
}

#[instrument(skip(state, admin))]
pub async fn list_pending(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = repo::list_by_status(&state.db, BookingStatus::Pending).await?;
    info!(admin_id = %admin.0.id, count = bookings.len(), "pending bookings listed");
    Ok(Json(bookings))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Booking>> {
    let booking = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    check_transition(booking.status, payload.status)?;

    if !repo::update_status(&state.db, id, booking.status, payload.status).await? {
        return Err(ApiError::Conflict("booking status changed concurrently".into()));
    }
    info!(
        admin_id = %admin.0.id,
        booking_id = %id,
        from = booking.status.as_str(),
        to = payload.status.as_str(),
        "booking status changed"
    );

    let updated = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    Query(q): Query<AvailabilityQuery>,
) -> ApiResult<Json<AvailabilityResponse>> {
    validate_range(q.start_date, q.end_date)?;

    let bookings = repo::overlapping(&state.db, q.start_date, q.end_date).await?;
    let rooms_booked: i64 = bookings.iter().map(|b| i64::from(b.rooms)).sum();
    let rooms_available = ensure_capacity(rooms_booked, 0).unwrap_or(0);
    let nights = nightly_availability(&bookings, q.start_date, q.end_date);

    Ok(Json(AvailabilityResponse {
        start_date: q.start_date,
        end_date: q.end_date,
        total_rooms: TOTAL_ROOMS,
        rooms_booked,
        rooms_available,
        nights,
        bookings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Marta".into(),
            surname: "Sosa".into(),
            dni: "31222333".into(),
            cuil_cuit: None,
            email: "marta@example.com".into(),
            phone: "1133330000".into(),
            guests: 1,
            password_hash: "$argon2id$unused".into(),
            active: true,
            is_admin,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owners_see_their_own_bookings() {
        let guest = user(false);
        assert!(may_view(guest.id, &guest));
    }

    #[test]
    fn other_guests_do_not_see_a_booking() {
        let guest = user(false);
        assert!(!may_view(Uuid::new_v4(), &guest));
    }

    #[test]
    fn admins_see_every_booking() {
        let admin = user(true);
        assert!(may_view(Uuid::new_v4(), &admin));
    }
}
