use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        jwt::{AuthUser, JwtKeys},
        services,
    },
    errors::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn sign_pair(state: &AppState, user_id: uuid::Uuid) -> Result<(String, String), AppError> {
    let keys = JwtKeys::from_ref(state);
    let access = keys.sign_access(user_id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::Dependency(e)
    })?;
    let refresh = keys.sign_refresh(user_id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        AppError::Dependency(e)
    })?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::register(
        state.users.as_ref(),
        &state.config.security,
        &payload.email,
        &payload.password,
        &payload.full_name,
    )
    .await?;
    let (access_token, refresh_token) = sign_pair(&state, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user =
        services::verify_login(state.users.as_ref(), &payload.email, &payload.password).await?;
    let (access_token, refresh_token) = sign_pair(&state, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        AppError::InvalidCredentials
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let (access_token, refresh_token) = sign_pair(&state, user.id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

/// Always answers with the same body so account existence does not leak.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let issued = services::issue_reset_token(
        state.users.as_ref(),
        state.reset_tokens.as_ref(),
        state.mailer.as_ref(),
        &state.config.security,
        &payload.email,
    )
    .await?;
    if let Some(issued) = &issued {
        if !issued.email_sent {
            warn!("reset token issued but email delivery failed");
        }
    }
    Ok(Json(MessageResponse {
        message: "If the account exists, a reset link has been sent.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::redeem_reset_token(
        state.users.as_ref(),
        state.reset_tokens.as_ref(),
        &state.config.security,
        &payload.token,
        &payload.new_password,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password updated.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use crate::auth::dto::PublicUser;

    #[test]
    fn public_user_serializes_without_hash() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            full_name: "Test".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
