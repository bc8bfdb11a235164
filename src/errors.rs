use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error kinds returned by the core services. Storage and SMTP faults are
/// wrapped into `Dependency` rather than surfaced as opaque failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("email already registered")]
    DuplicateUser,
    #[error("not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid reset token")]
    InvalidToken,
    #[error("reset token expired")]
    ExpiredToken,
    #[error("reset token already used")]
    TokenAlreadyUsed,
    #[error("dependency failure: {0}")]
    Dependency(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken => StatusCode::BAD_REQUEST,
            AppError::ExpiredToken => StatusCode::BAD_REQUEST,
            AppError::TokenAlreadyUsed => StatusCode::CONFLICT,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            AppError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateUser.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::TokenAlreadyUsed.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Dependency(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_credentials_message_does_not_leak_account_existence() {
        // Unknown email and wrong password must render identically.
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
    }
}
