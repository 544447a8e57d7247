use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::CreatePaymentRequest, repo, repo_types::Payment};
use crate::{
    auth::extractors::{ActiveUser, AdminUser},
    bookings::{
        self, handlers::visible_booking, repo_types::BookingStatus, services::ensure_amount,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/api/reservas/:id/pagos", get(list).post(create))
}

pub fn validate_payment(req: &CreatePaymentRequest) -> ApiResult<()> {
    ensure_amount(req.amount, "amount")
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Payment>>> {
    let booking = visible_booking(&state, &user, id).await?;
    Ok(Json(repo::list_by_booking(&state.db, booking.id).await?))
}

#[instrument(skip(state, admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    validate_payment(&payload)?;

    let booking = bookings::repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("booking not found".into()))?;
    if booking.status == BookingStatus::Cancelled {
        return Err(ApiError::BadRequest(
            "cannot record a payment for a cancelled booking".into(),
        ));
    }

    let payment = repo::insert(&state.db, booking.id, &payload).await?;
    info!(
        admin_id = %admin.0.id,
        booking_id = %booking.id,
        payment_id = %payment.id,
        amount = payment.amount,
        kind = payment.payment_type.as_str(),
        "payment recorded"
    );
    Ok((StatusCode::CREATED, Json(payment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::repo_types::{PaymentMethod, PaymentStatus, PaymentType};

    #[test]
    fn payment_amount_must_be_positive() {
        let mut req = CreatePaymentRequest {
            payment_type: PaymentType::Deposit,
            amount: 25_000.0,
            method: PaymentMethod::Transfer,
            status: PaymentStatus::Pending,
            receipt: None,
            note: None,
        };
        assert!(validate_payment(&req).is_ok());
        req.amount = 0.0;
        assert!(validate_payment(&req).is_err());
        req.amount = -5.0;
        assert!(validate_payment(&req).is_err());
        req.amount = f64::NAN;
        assert!(validate_payment(&req).is_err());
    }

    #[test]
    fn payment_amount_must_fit_the_amount_column() {
        let mut req = CreatePaymentRequest {
            payment_type: PaymentType::FullPayment,
            amount: 99_999_999.99,
            method: PaymentMethod::Transfer,
            status: PaymentStatus::Paid,
            receipt: None,
            note: None,
        };
        assert!(validate_payment(&req).is_ok());
        req.amount = 100_000_000.0;
        match validate_payment(&req) {
            Err(ApiError::BadRequest(m)) => assert!(m.contains("cannot exceed")),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn request_defaults_to_pending_status() {
        let req: CreatePaymentRequest = serde_json::from_str(
            r#"{"tipo_pago": "pago_completo", "monto": 100000, "metodo_pago": "efectivo"}"#,
        )
        .unwrap();
        assert_eq!(req.payment_type, PaymentType::FullPayment);
        assert_eq!(req.method, PaymentMethod::Cash);
        assert_eq!(req.status, PaymentStatus::Pending);
        assert_eq!(req.amount, 100_000.0);
    }
}
