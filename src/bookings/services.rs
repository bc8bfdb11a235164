use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::services::normalize_email;
use crate::bookings::dto::{CreateBookingRequest, RescheduleRequest};
use crate::bookings::repo::BookingStore;
use crate::bookings::repo_types::{Booking, BookingStatus};
use crate::email::{booking_confirmation_email, Mailer};
use crate::errors::AppError;

pub async fn check_customer_exists(
    users: &dyn UserStore,
    email: &str,
) -> Result<bool, AppError> {
    Ok(users.find_by_email(&normalize_email(email)).await?.is_some())
}

#[derive(Debug)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub email_sent: bool,
}

/// Creates a booking for a registered customer. Guest bookings are not
/// allowed: an unregistered email fails with `NotFound`, matching the
/// behavior of the booking flow this replaces.
pub async fn create_booking(
    users: &dyn UserStore,
    bookings: &dyn BookingStore,
    mailer: &dyn Mailer,
    customer_email: &str,
    req: CreateBookingRequest,
) -> Result<CreatedBooking, AppError> {
    let customer_email = normalize_email(customer_email);
    if !check_customer_exists(users, &customer_email).await? {
        warn!(email = %customer_email, "booking for unknown customer");
        return Err(AppError::NotFound);
    }

    if req.service_type.trim().is_empty() || req.destination.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "service_type and destination are required".into(),
        ));
    }
    if req.num_travelers < 1 {
        return Err(AppError::InvalidInput(
            "num_travelers must be at least 1".into(),
        ));
    }
    if let Some(return_date) = req.return_date {
        if return_date < req.departure_date {
            return Err(AppError::InvalidInput(
                "return_date must not precede departure_date".into(),
            ));
        }
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        customer_email,
        service_type: req.service_type.trim().to_string(),
        destination: req.destination.trim().to_string(),
        departure_date: req.departure_date,
        return_date: req.return_date,
        num_travelers: req.num_travelers,
        service_details: req.service_details,
        special_requests: req.special_requests,
        total_amount: req.total_amount,
        status: BookingStatus::Confirmed,
        created_at: OffsetDateTime::now_utc(),
    };
    bookings.insert(&booking).await?;
    info!(booking_id = %booking.id, email = %booking.customer_email, "booking created");

    let (subject, body) = booking_confirmation_email(&booking);
    let email_sent = match mailer.send(&booking.customer_email, &subject, &body).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, booking_id = %booking.id, "confirmation email dispatch failed");
            false
        }
    };

    Ok(CreatedBooking {
        booking,
        email_sent,
    })
}

pub async fn list_bookings(
    bookings: &dyn BookingStore,
    customer_email: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Booking>, AppError> {
    Ok(bookings
        .list_by_email(&normalize_email(customer_email), limit, offset)
        .await?)
}

pub async fn cancel_booking(
    bookings: &dyn BookingStore,
    id: Uuid,
    customer_email: &str,
) -> Result<(), AppError> {
    let customer_email = normalize_email(customer_email);
    let booking = bookings.find(id).await?.ok_or(AppError::NotFound)?;
    if booking.customer_email != customer_email {
        // Another customer's booking looks like no booking at all.
        return Err(AppError::NotFound);
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::InvalidInput("booking is already cancelled".into()));
    }
    if !bookings.cancel(id, &customer_email).await? {
        return Err(AppError::InvalidInput("booking is already cancelled".into()));
    }
    info!(booking_id = %id, email = %customer_email, "booking cancelled");
    Ok(())
}

pub async fn reschedule_booking(
    bookings: &dyn BookingStore,
    id: Uuid,
    customer_email: &str,
    req: RescheduleRequest,
) -> Result<Booking, AppError> {
    if req.departure_date.is_none() && req.return_date.is_none() {
        return Err(AppError::InvalidInput("no new dates provided".into()));
    }
    let customer_email = normalize_email(customer_email);
    let booking = bookings.find(id).await?.ok_or(AppError::NotFound)?;
    if booking.customer_email != customer_email {
        return Err(AppError::NotFound);
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::InvalidInput(
            "cannot reschedule a cancelled booking".into(),
        ));
    }
    let updated = bookings
        .update_dates(id, &customer_email, req.departure_date, req.return_date)
        .await?
        .ok_or_else(|| AppError::InvalidInput("cannot reschedule a cancelled booking".into()))?;
    info!(booking_id = %id, email = %customer_email, "booking rescheduled");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::auth::repo::MemoryUserStore;
    use crate::auth::services::register;
    use crate::bookings::repo::MemoryBookingStore;
    use crate::config::SecurityConfig;
    use crate::email::LogMailer;

    fn security() -> SecurityConfig {
        SecurityConfig {
            min_password_len: 8,
            kdf_time_cost: 1,
            reset_token_ttl_minutes: 30,
            reset_link_base: "http://localhost:8080".into(),
        }
    }

    fn flight_request() -> CreateBookingRequest {
        CreateBookingRequest {
            service_type: "Flight".into(),
            destination: "Jeddah".into(),
            departure_date: date!(2026 - 10 - 01),
            return_date: Some(date!(2026 - 10 - 14)),
            num_travelers: 2,
            service_details: Some("Business".into()),
            special_requests: None,
            total_amount: 1850.0,
        }
    }

    async fn registered_users() -> MemoryUserStore {
        let users = MemoryUserStore::default();
        register(&users, &security(), "bob@example.com", "Secret123", "Bob")
            .await
            .unwrap();
        users
    }

    #[tokio::test]
    async fn check_customer_exists_tracks_registration() {
        let users = registered_users().await;
        assert!(check_customer_exists(&users, "bob@example.com").await.unwrap());
        assert!(!check_customer_exists(&users, "nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn booking_for_unregistered_email_is_not_found() {
        let users = MemoryUserStore::default();
        let bookings = MemoryBookingStore::default();
        let err = create_booking(&users, &bookings, &LogMailer, "bob@example.com", flight_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn created_booking_is_confirmed_and_listed() {
        let users = registered_users().await;
        let bookings = MemoryBookingStore::default();
        let created =
            create_booking(&users, &bookings, &LogMailer, "Bob@Example.com", flight_request())
                .await
                .unwrap();
        assert_eq!(created.booking.status, BookingStatus::Confirmed);
        assert_eq!(created.booking.customer_email, "bob@example.com");
        assert!(created.email_sent);

        let listed = list_bookings(&bookings, "bob@example.com", 20, 0)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.booking.id);
    }

    #[tokio::test]
    async fn create_rejects_invalid_details() {
        let users = registered_users().await;
        let bookings = MemoryBookingStore::default();

        let mut req = flight_request();
        req.num_travelers = 0;
        assert!(matches!(
            create_booking(&users, &bookings, &LogMailer, "bob@example.com", req).await,
            Err(AppError::InvalidInput(_))
        ));

        let mut req = flight_request();
        req.return_date = Some(date!(2026 - 09 - 01));
        assert!(matches!(
            create_booking(&users, &bookings, &LogMailer, "bob@example.com", req).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn cancel_is_single_shot_and_ownership_checked() {
        let users = registered_users().await;
        let bookings = MemoryBookingStore::default();
        let created =
            create_booking(&users, &bookings, &LogMailer, "bob@example.com", flight_request())
                .await
                .unwrap();
        let id = created.booking.id;

        // Someone else's email cannot touch the booking.
        assert!(matches!(
            cancel_booking(&bookings, id, "eve@example.com").await,
            Err(AppError::NotFound)
        ));

        cancel_booking(&bookings, id, "bob@example.com").await.unwrap();
        assert_eq!(
            bookings.find(id).await.unwrap().unwrap().status,
            BookingStatus::Cancelled
        );
        assert!(matches!(
            cancel_booking(&bookings, id, "bob@example.com").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn reschedule_updates_dates_but_not_cancelled_bookings() {
        let users = registered_users().await;
        let bookings = MemoryBookingStore::default();
        let created =
            create_booking(&users, &bookings, &LogMailer, "bob@example.com", flight_request())
                .await
                .unwrap();
        let id = created.booking.id;

        assert!(matches!(
            reschedule_booking(
                &bookings,
                id,
                "bob@example.com",
                RescheduleRequest { departure_date: None, return_date: None }
            )
            .await,
            Err(AppError::InvalidInput(_))
        ));

        let updated = reschedule_booking(
            &bookings,
            id,
            "bob@example.com",
            RescheduleRequest {
                departure_date: Some(date!(2026 - 11 - 05)),
                return_date: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.departure_date, date!(2026 - 11 - 05));
        assert_eq!(updated.return_date, Some(date!(2026 - 10 - 14)));

        cancel_booking(&bookings, id, "bob@example.com").await.unwrap();
        assert!(matches!(
            reschedule_booking(
                &bookings,
                id,
                "bob@example.com",
                RescheduleRequest {
                    departure_date: Some(date!(2026 - 12 - 01)),
                    return_date: None,
                }
            )
            .await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
