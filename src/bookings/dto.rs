use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::bookings::repo_types::Booking;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub service_type: String,
    pub destination: String,
    pub departure_date: Date,
    pub return_date: Option<Date>,
    #[serde(default = "default_travelers")]
    pub num_travelers: i32,
    pub service_details: Option<String>,
    pub special_requests: Option<String>,
    #[serde(default)]
    pub total_amount: f64,
}

fn default_travelers() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub departure_date: Option<Date>,
    pub return_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct CreatedBookingResponse {
    pub booking: Booking,
    /// Confirmation email is best-effort; creation succeeds regardless.
    pub confirmation_email_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelledBookingResponse {
    pub booking_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
