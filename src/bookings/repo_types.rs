use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Travel booking record. References the customer by email, not ownership;
/// immutable after creation except for status and dates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub customer_email: String,
    pub service_type: String, // Flight, Hotel, Package
    pub destination: String,
    pub departure_date: Date,
    pub return_date: Option<Date>,
    pub num_travelers: i32,
    pub service_details: Option<String>, // class, room type, package type
    pub special_requests: Option<String>,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub created_at: OffsetDateTime,
}
