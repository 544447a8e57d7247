use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use time::Date;
use uuid::Uuid;

use super::repo_types::{Booking, BookingRow, BookingStatus, OccupiedRange};

const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.check_in, b.check_out, b.rooms,
           b.total_price::float8 AS total_price, b.status, b.notes,
           u.email AS contact_email, b.created_at
      FROM bookings b
      JOIN users u ON u.id = b.user_id
"#;

/// Advisory lock key serialising every capacity check with its insert.
const CALENDAR_LOCK_KEY: i64 = 0x706f_7361_6461;

fn into_bookings(rows: Vec<BookingRow>) -> anyhow::Result<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

/// Blocks until no other transaction holds the calendar; released on commit or rollback.
pub async fn lock_calendar(conn: &mut PgConnection) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CALENDAR_LOCK_KEY)
        .execute(conn)
        .await
        .context("lock calendar")?;
    Ok(())
}

/// Sum of rooms held by active bookings overlapping `[check_in, check_out)`.
pub async fn booked_rooms(
    conn: &mut PgConnection,
    check_in: Date,
    check_out: Date,
) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(rooms), 0)::BIGINT
          FROM bookings
         WHERE check_in < $2
           AND check_out > $1
           AND status NOT IN ('cancelled', 'finished')
        "#,
    )
    .bind(check_in)
    .bind(check_out)
    .fetch_one(conn)
    .await
    .context("sum booked rooms")?;
    Ok(total)
}

/// Nightly rate currently in force, if any row is active.
pub async fn current_nightly_price(conn: &mut PgConnection) -> anyhow::Result<Option<f64>> {
    let price: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT nightly_price::float8
          FROM prices
         WHERE active = true AND effective_from <= CURRENT_DATE
         ORDER BY effective_from DESC, created_at DESC
         LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await
    .context("load nightly price")?;
    Ok(price)
}

pub async fn insert(
    conn: &mut PgConnection,
    user_id: Uuid,
    check_in: Date,
    check_out: Date,
    rooms: i32,
    total_price: f64,
    notes: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO bookings (user_id, check_in, check_out, rooms, total_price, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(check_in)
    .bind(check_out)
    .bind(rooms)
    .bind(total_price)
    .bind(notes)
    .fetch_one(conn)
    .await
    .context("insert booking")?;
    Ok(id)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Booking>> {
    let row = sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_SELECT} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find booking")?;
    row.map(Booking::try_from).transpose()
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Booking>> {
    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        "{BOOKING_SELECT} WHERE b.user_id = $1 ORDER BY b.check_in DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list bookings by user")?;
    into_bookings(rows)
}

pub async fn list_by_status(db: &PgPool, status: BookingStatus) -> anyhow::Result<Vec<Booking>> {
    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        "{BOOKING_SELECT} WHERE b.status = $1 ORDER BY b.check_in, b.created_at"
    ))
    .bind(status.as_str())
    .fetch_all(db)
    .await
    .context("list bookings by status")?;
    into_bookings(rows)
}

/// Active bookings overlapping `[start, end)`.
pub async fn overlapping(
    db: &PgPool,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<OccupiedRange>> {
    let rows = sqlx::query_as::<_, OccupiedRange>(
        r#"
        SELECT check_in, check_out, rooms
          FROM bookings
         WHERE check_in < $2
           AND check_out > $1
           AND status NOT IN ('cancelled', 'finished')
         ORDER BY check_in
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
    .context("list overlapping bookings")?;
    Ok(rows)
}

/// Moves a booking from `from` to `to`. Returns false if its status changed meanwhile.
pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2")
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(db)
        .await
        .context("update booking status")?;
    Ok(res.rows_affected() == 1)
}

pub async fn count_active_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
          FROM bookings
         WHERE user_id = $1 AND status NOT IN ('cancelled', 'finished')
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
    .context("count active bookings")?;
    Ok(count)
}
