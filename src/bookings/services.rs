use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateBookingRequest, NightAvailability},
    repo,
    repo_types::{Booking, BookingStatus, OccupiedRange},
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Rooms in the posada.
pub const TOTAL_ROOMS: i32 = 4;
pub const MIN_NIGHTS: i64 = 2;
pub const MAX_NIGHTS: i64 = 365;
/// Largest amount a `NUMERIC(10,2)` money column holds.
pub const MAX_AMOUNT: f64 = 99_999_999.99;
/// Longest range the availability calendar expands night by night.
pub const MAX_CALENDAR_NIGHTS: i64 = 366;

/// A stay that passed every check not needing the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stay {
    pub check_in: Date,
    pub check_out: Date,
    pub rooms: i32,
}

impl Stay {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).whole_days()
    }
}

pub fn validate_stay(req: &CreateBookingRequest, today: Date) -> ApiResult<Stay> {
    if req.check_out <= req.check_in {
        return Err(ApiError::BadRequest("check-out must be after check-in".into()));
    }
    if !(1..=TOTAL_ROOMS).contains(&req.rooms) {
        return Err(ApiError::BadRequest(format!(
            "rooms must be between 1 and {TOTAL_ROOMS}"
        )));
    }
    if req.check_in < today {
        return Err(ApiError::BadRequest("check-in cannot be in the past".into()));
    }
    let stay = Stay {
        check_in: req.check_in,
        check_out: req.check_out,
        rooms: req.rooms,
    };
    if stay.nights() < MIN_NIGHTS {
        return Err(ApiError::BadRequest(format!(
            "a booking must be for at least {MIN_NIGHTS} nights"
        )));
    }
    if stay.nights() > MAX_NIGHTS {
        return Err(ApiError::BadRequest(format!(
            "a booking cannot exceed {MAX_NIGHTS} nights"
        )));
    }
    Ok(stay)
}

/// Rooms left after adding `requested` to `already_booked`.
pub fn ensure_capacity(already_booked: i64, requested: i32) -> ApiResult<i64> {
    let booked = already_booked.max(0);
    let left = i64::from(TOTAL_ROOMS) - booked - i64::from(requested);
    if left < 0 {
        return Err(ApiError::Conflict(
            "not enough rooms available for those dates".into(),
        ));
    }
    Ok(left)
}

/// Total price rounded to cents.
pub fn quote(nights: i64, rooms: i32, nightly_price: f64) -> f64 {
    let total = nights as f64 * f64::from(rooms) * nightly_price;
    (total * 100.0).round() / 100.0
}

/// Rejects money amounts that are not positive or do not fit the database columns.
pub fn ensure_amount(amount: f64, what: &str) -> ApiResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::BadRequest(format!("{what} must be greater than zero")));
    }
    if amount > MAX_AMOUNT {
        return Err(ApiError::BadRequest(format!(
            "{what} cannot exceed {MAX_AMOUNT:.2}"
        )));
    }
    Ok(())
}

pub fn check_transition(from: BookingStatus, to: BookingStatus) -> ApiResult<()> {
    use BookingStatus::*;
    match (from, to) {
        (Pending, Confirmed)
        | (Pending, Cancelled)
        | (Confirmed, Cancelled)
        | (Confirmed, Finished) => Ok(()),
        _ => Err(ApiError::BadRequest(format!(
            "cannot change a {} booking to {}",
            from.as_str(),
            to.as_str()
        ))),
    }
}

pub fn validate_range(start: Date, end: Date) -> ApiResult<()> {
    if end <= start {
        return Err(ApiError::BadRequest("end_date must be after start_date".into()));
    }
    if (end - start).whole_days() > MAX_CALENDAR_NIGHTS {
        return Err(ApiError::BadRequest(format!(
            "range cannot exceed {MAX_CALENDAR_NIGHTS} nights"
        )));
    }
    Ok(())
}

/// Rooms booked and free on each night of `[start, end)`.
pub fn nightly_availability(
    ranges: &[OccupiedRange],
    start: Date,
    end: Date,
) -> Vec<NightAvailability> {
    let mut nights = Vec::new();
    let mut day = start;
    while day < end {
        let booked: i64 = ranges
            .iter()
            .filter(|r| r.check_in <= day && day < r.check_out)
            .map(|r| i64::from(r.rooms.max(0)))
            .sum();
        nights.push(NightAvailability {
            date: day,
            rooms_booked: booked,
            rooms_available: (i64::from(TOTAL_ROOMS) - booked).max(0),
        });
        match day.next_day() {
            Some(next) => day = next,
            None => break,
        }
    }
    nights
}

/// Checks capacity and inserts a pending booking in one transaction.
///
/// The transaction holds an advisory lock for its whole duration, so two
/// concurrent requests cannot both pass the capacity check.
pub async fn create_booking(
    state: &AppState,
    user_id: Uuid,
    contact_email: &str,
    stay: Stay,
) -> ApiResult<Booking> {
    let mut tx = state.db.begin().await?;
    repo::lock_calendar(&mut *tx).await?;

    let already = repo::booked_rooms(&mut *tx, stay.check_in, stay.check_out).await?;
    if let Err(e) = ensure_capacity(already, stay.rooms) {
        warn!(
            already_booked = already,
            requested = stay.rooms,
            check_in = %stay.check_in,
            check_out = %stay.check_out,
            "booking refused, no capacity"
        );
        return Err(e);
    }

    let nightly = repo::current_nightly_price(&mut *tx)
        .await?
        .unwrap_or(state.config.booking.default_nightly_price);
    let total = quote(stay.nights(), stay.rooms, nightly);
    ensure_amount(total, "total price")?;
    let notes = format!("Contact: {contact_email}");

    let id = repo::insert(
        &mut *tx,
        user_id,
        stay.check_in,
        stay.check_out,
        stay.rooms,
        total,
        &notes,
    )
    .await?;
    tx.commit().await?;

    info!(
        booking_id = %id,
        %user_id,
        contact = %contact_email,
        check_in = %stay.check_in,
        check_out = %stay.check_out,
        rooms = stay.rooms,
        total_price = total,
        "new pending booking, contact guest for payment"
    );

    repo::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("booking {id} vanished after insert")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2030 - 03 - 10);

    fn req(check_in: Date, check_out: Date, rooms: i32) -> CreateBookingRequest {
        CreateBookingRequest {
            check_in,
            check_out,
            rooms,
        }
    }

    fn bad_request_message(r: ApiResult<Stay>) -> String {
        match r {
            Err(ApiError::BadRequest(m)) => m,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn accepts_two_night_stay() {
        let stay = validate_stay(&req(TODAY, date!(2030 - 03 - 12), 2), TODAY).unwrap();
        assert_eq!(stay.nights(), 2);
        assert_eq!(stay.rooms, 2);
    }

    fn check(check_in: Date, check_out: Date, rooms: i32) -> String {
        bad_request_message(validate_stay(&req(check_in, check_out, rooms), TODAY))
    }

    #[test]
    fn rejects_checkout_before_or_on_checkin() {
        let m = check(date!(2030 - 03 - 20), date!(2030 - 03 - 15), 1);
        assert!(m.contains("check-out"));
        let m = check(date!(2030 - 03 - 20), date!(2030 - 03 - 20), 1);
        assert!(m.contains("check-out"));
    }

    #[test]
    fn rejects_room_count_out_of_bounds() {
        for rooms in [0, -1, 5] {
            let m = check(TODAY, date!(2030 - 03 - 14), rooms);
            assert!(m.contains("rooms"));
        }
        assert!(validate_stay(&req(TODAY, date!(2030 - 03 - 14), 4), TODAY).is_ok());
    }

    #[test]
    fn rejects_past_checkin() {
        let m = check(date!(2030 - 03 - 09), date!(2030 - 03 - 14), 1);
        assert!(m.contains("past"));
    }

    #[test]
    fn enforces_two_night_minimum() {
        let m = check(TODAY, date!(2030 - 03 - 11), 1);
        assert!(m.contains("at least 2 nights"));
    }

    #[test]
    fn rejects_stays_longer_than_a_year() {
        let m = check(date!(2030 - 01 - 01), date!(2031 - 05 - 16), 4);
        assert!(m.contains("cannot exceed"));
        let longest = validate_stay(&req(TODAY, date!(2031 - 03 - 10), 4), TODAY).unwrap();
        assert_eq!(longest.nights(), MAX_NIGHTS);
    }

    #[test]
    fn amounts_must_fit_the_money_columns() {
        assert!(ensure_amount(quote(MAX_NIGHTS, 4, 50_000.0), "total price").is_ok());
        assert!(ensure_amount(MAX_AMOUNT, "amount").is_ok());
        assert!(ensure_amount(quote(500, 4, 50_000.0), "total price").is_err());
        assert!(ensure_amount(quote(MAX_NIGHTS, 4, 1_000_000.0), "total price").is_err());
        assert!(ensure_amount(0.0, "amount").is_err());
        assert!(ensure_amount(f64::INFINITY, "amount").is_err());
    }

    #[test]
    fn capacity_guard() {
        assert_eq!(ensure_capacity(0, 4).unwrap(), 0);
        assert_eq!(ensure_capacity(2, 1).unwrap(), 1);
        assert!(matches!(ensure_capacity(3, 2), Err(ApiError::Conflict(_))));
        assert!(matches!(ensure_capacity(4, 1), Err(ApiError::Conflict(_))));
    }

    #[test]
    fn negative_booked_total_is_treated_as_zero() {
        assert_eq!(ensure_capacity(-3, 4).unwrap(), 0);
        assert!(ensure_capacity(-3, 5).is_err());
    }

    #[test]
    fn quote_multiplies_nights_rooms_and_rate() {
        assert_eq!(quote(2, 1, 100.0), 200.0);
        assert_eq!(quote(3, 2, 50_000.0), 300_000.0);
        assert_eq!(quote(2, 1, 33.333), 66.67);
    }

    #[test]
    fn status_transitions() {
        use BookingStatus::*;
        assert!(check_transition(Pending, Confirmed).is_ok());
        assert!(check_transition(Pending, Cancelled).is_ok());
        assert!(check_transition(Confirmed, Finished).is_ok());
        assert!(check_transition(Confirmed, Cancelled).is_ok());
        assert!(check_transition(Pending, Finished).is_err());
        assert!(check_transition(Cancelled, Confirmed).is_err());
        assert!(check_transition(Finished, Pending).is_err());
        assert!(check_transition(Pending, Pending).is_err());
    }

    #[test]
    fn range_validation() {
        assert!(validate_range(TODAY, date!(2030 - 03 - 11)).is_ok());
        assert!(validate_range(TODAY, TODAY).is_err());
        assert!(validate_range(TODAY, date!(2031 - 06 - 01)).is_err());
    }

    fn range(check_in: Date, check_out: Date, rooms: i32) -> OccupiedRange {
        OccupiedRange {
            check_in,
            check_out,
            rooms,
        }
    }

    #[test]
    fn nightly_breakdown_uses_half_open_stays() {
        let ranges = vec![
            range(date!(2030 - 03 - 10), date!(2030 - 03 - 12), 3),
            range(date!(2030 - 03 - 12), date!(2030 - 03 - 14), 1),
            range(date!(2030 - 03 - 11), date!(2030 - 03 - 13), 1),
        ];
        let nights = nightly_availability(&ranges, TODAY, date!(2030 - 03 - 14));
        let booked: Vec<i64> = nights.iter().map(|n| n.rooms_booked).collect();
        assert_eq!(booked, vec![3, 4, 2, 1]);
        assert_eq!(nights[1].rooms_available, 0);
        assert_eq!(nights[3].rooms_available, 3);
        assert!(nights.iter().all(|n| n.rooms_available >= 0));
    }

    #[test]
    fn nightly_breakdown_never_goes_negative() {
        let ranges = vec![range(TODAY, date!(2030 - 03 - 11), 6)];
        let nights = nightly_availability(&ranges, TODAY, date!(2030 - 03 - 11));
        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].rooms_available, 0);
    }
}
