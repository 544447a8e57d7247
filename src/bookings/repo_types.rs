use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[serde(alias = "pendiente")]
    Pending,
    #[serde(alias = "confirmada")]
    Confirmed,
    #[serde(alias = "cancelada")]
    Cancelled,
    #[serde(alias = "finalizada")]
    Finished,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Finished => "finished",
        }
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "finished" => Ok(BookingStatus::Finished),
            other => anyhow::bail!("unknown booking status {:?}", other),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub check_in: Date,
    pub check_out: Date,
    pub rooms: i32,
    pub total_price: f64,
    pub status: String,
    pub notes: Option<String>,
    pub contact_email: String,
    pub created_at: OffsetDateTime,
}

/// Booking joined with the contact email of its owner.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub check_in: Date,
    pub check_out: Date,
    pub rooms: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub contact_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<BookingRow> for Booking {
    type Error = anyhow::Error;

    fn try_from(r: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: BookingStatus::try_from(r.status.as_str())?,
            id: r.id,
            user_id: r.user_id,
            check_in: r.check_in,
            check_out: r.check_out,
            rooms: r.rooms,
            total_price: r.total_price,
            notes: r.notes,
            contact_email: r.contact_email,
            created_at: r.created_at,
        })
    }
}

/// Dates and room count of an active booking, as shown on the calendar.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OccupiedRange {
    pub check_in: Date,
    pub check_out: Date,
    pub rooms: i32,
}
