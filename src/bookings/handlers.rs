use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    bookings::{
        dto::{
            CancelledBookingResponse, CreateBookingRequest, CreatedBookingResponse, Pagination,
            RescheduleRequest,
        },
        repo_types::Booking,
        services,
    },
    errors::AppError,
    state::AppState,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/bookings/:id/reschedule", post(reschedule_booking))
}

/// Every booking operation is scoped to the authenticated user's email.
async fn require_email(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    Ok(user.email)
}

#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let email = require_email(&state, user_id).await?;
    let bookings =
        services::list_bookings(state.bookings.as_ref(), &email, p.limit, p.offset).await?;
    Ok(Json(bookings))
}

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreatedBookingResponse>), AppError> {
    let email = require_email(&state, user_id).await?;
    let created = services::create_booking(
        state.users.as_ref(),
        state.bookings.as_ref(),
        state.mailer.as_ref(),
        &email,
        payload,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedBookingResponse {
            booking: created.booking,
            confirmation_email_sent: created.email_sent,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelledBookingResponse>, AppError> {
    let email = require_email(&state, user_id).await?;
    services::cancel_booking(state.bookings.as_ref(), id, &email).await?;
    Ok(Json(CancelledBookingResponse {
        booking_id: id,
        message: "Booking cancelled successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reschedule_booking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let email = require_email(&state, user_id).await?;
    let booking =
        services::reschedule_booking(state.bookings.as_ref(), id, &email, payload).await?;
    Ok(Json(booking))
}
