use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    dto::CreatePaymentRequest,
    repo_types::{Payment, PaymentRow},
};

const PAYMENT_COLUMNS: &str = "id, booking_id, payment_type, amount::float8 AS amount, method, \
                               status, receipt, note, paid_at";

pub async fn insert(
    db: &PgPool,
    booking_id: Uuid,
    req: &CreatePaymentRequest,
) -> anyhow::Result<Payment> {
    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        INSERT INTO payments (booking_id, payment_type, amount, method, status, receipt, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(booking_id)
    .bind(req.payment_type.as_str())
    .bind(req.amount)
    .bind(req.method.as_str())
    .bind(req.status.as_str())
    .bind(&req.receipt)
    .bind(&req.note)
    .fetch_one(db)
    .await
    .context("insert payment")?;
    Payment::try_from(row)
}

pub async fn list_by_booking(db: &PgPool, booking_id: Uuid) -> anyhow::Result<Vec<Payment>> {
    let rows = sqlx::query_as::<_, PaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1 ORDER BY paid_at"
    ))
    .bind(booking_id)
    .fetch_all(db)
    .await
    .context("list payments")?;
    rows.into_iter().map(Payment::try_from).collect()
}
