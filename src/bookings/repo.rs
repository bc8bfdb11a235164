use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::bookings::repo_types::{Booking, BookingStatus};

/// Persistence for booking records. Status changes are guarded so a
/// cancelled booking stays cancelled.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Booking>>;
    async fn list_by_email(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Booking>>;
    /// Marks the booking cancelled. Returns false when it does not exist,
    /// belongs to another customer, or is already cancelled.
    async fn cancel(&self, id: Uuid, email: &str) -> anyhow::Result<bool>;
    /// Updates the travel dates, refusing cancelled bookings. Returns the
    /// updated record, or None when nothing matched.
    async fn update_dates(
        &self,
        id: Uuid,
        email: &str,
        departure_date: Option<Date>,
        return_date: Option<Date>,
    ) -> anyhow::Result<Option<Booking>>;
}

const BOOKING_COLUMNS: &str = "id, customer_email, service_type, destination, departure_date, \
     return_date, num_travelers, service_details, special_requests, total_amount, status, created_at";

pub struct PgBookingStore {
    db: PgPool,
}

impl PgBookingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, booking: &Booking) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, customer_email, service_type, destination, departure_date, return_date,
                 num_travelers, service_details, special_requests, total_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.customer_email)
        .bind(&booking.service_type)
        .bind(&booking.destination)
        .bind(booking.departure_date)
        .bind(booking.return_date)
        .bind(booking.num_travelers)
        .bind(&booking.service_details)
        .bind(&booking.special_requests)
        .bind(booking.total_amount)
        .bind(booking.status)
        .bind(booking.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Booking>> {
        let row = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_email(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE customer_email = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(email)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn cancel(&self, id: Uuid, email: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = 'cancelled'
            WHERE id = $1 AND customer_email = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(id)
        .bind(email)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_dates(
        &self,
        id: Uuid,
        email: &str,
        departure_date: Option<Date>,
        return_date: Option<Date>,
    ) -> anyhow::Result<Option<Booking>> {
        let row = sqlx::query_as::<_, Booking>(&format!(
            "UPDATE bookings SET
                 departure_date = COALESCE($3, departure_date),
                 return_date = COALESCE($4, return_date)
             WHERE id = $1 AND customer_email = $2 AND status <> 'cancelled'
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .bind(departure_date)
        .bind(return_date)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}

// --- In-memory (tests and AppState::fake) ---

#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> anyhow::Result<()> {
        self.bookings
            .lock()
            .unwrap()
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_email(
        &self,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        let mut rows: Vec<Booking> = bookings
            .values()
            .filter(|b| b.customer_email == email)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn cancel(&self, id: Uuid, email: &str) -> anyhow::Result<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.customer_email == email && b.status != BookingStatus::Cancelled => {
                b.status = BookingStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_dates(
        &self,
        id: Uuid,
        email: &str,
        departure_date: Option<Date>,
        return_date: Option<Date>,
    ) -> anyhow::Result<Option<Booking>> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.customer_email == email && b.status != BookingStatus::Cancelled => {
                if let Some(d) = departure_date {
                    b.departure_date = d;
                }
                if let Some(d) = return_date {
                    b.return_date = Some(d);
                }
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }
}
