use serde::{Deserialize, Serialize};
use time::Date;

use super::repo_types::{BookingStatus, OccupiedRange};

/// Body of `POST /api/reservas`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "fecha_check_in")]
    pub check_in: Date,
    #[serde(alias = "fecha_check_out")]
    pub check_out: Date,
    #[serde(alias = "cantidad_habitaciones")]
    pub rooms: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(alias = "estado")]
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: Date,
    pub end_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightAvailability {
    pub date: Date,
    pub rooms_booked: i64,
    pub rooms_available: i64,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub start_date: Date,
    pub end_date: Date,
    pub total_rooms: i32,
    /// Same aggregate the booking guard uses for this range.
    pub rooms_booked: i64,
    pub rooms_available: i64,
    pub nights: Vec<NightAvailability>,
    pub bookings: Vec<OccupiedRange>,
}
