use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::auth::password::{check_password_policy, hash_password, verify_password};
use crate::auth::repo::{ResetTokenStore, UserStore};
use crate::auth::repo_types::{ResetToken, User};
use crate::config::SecurityConfig;
use crate::email::{password_reset_email, Mailer};
use crate::errors::AppError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 32 bytes from the OS CSPRNG, hex encoded: 256 bits of entropy.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// --- credential store ---

pub async fn register(
    users: &dyn UserStore,
    security: &SecurityConfig,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::InvalidInput("invalid email address".into()));
    }
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::InvalidInput("full name is required".into()));
    }
    check_password_policy(password, security.min_password_len)?;

    let hash = hash_password(password, security.kdf_time_cost)?;
    match users.insert_if_absent(&email, full_name, &hash).await? {
        Some(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        None => {
            warn!(email = %email, "email already registered");
            Err(AppError::DuplicateUser)
        }
    }
}

/// Unknown email and wrong password both map to `InvalidCredentials`, so a
/// caller cannot probe which accounts exist.
pub async fn verify_login(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    let user = match users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }
    users.touch_last_login(user.id).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}

/// Overwrites the stored hash with a freshly salted one.
pub async fn set_password(
    users: &dyn UserStore,
    security: &SecurityConfig,
    email: &str,
    new_password: &str,
) -> Result<(), AppError> {
    check_password_policy(new_password, security.min_password_len)?;
    let hash = hash_password(new_password, security.kdf_time_cost)?;
    if !users.update_password(&normalize_email(email), &hash).await? {
        return Err(AppError::NotFound);
    }
    Ok(())
}

// --- reset-token manager ---

#[derive(Debug)]
pub struct IssuedReset {
    pub token: String,
    pub expires_at: OffsetDateTime,
    /// False when the notification could not be delivered; the token is
    /// still valid and redeemable.
    pub email_sent: bool,
}

/// Issues a reset token for a known account. Returns Ok(None) for an
/// unknown email: nothing is stored or sent, and the HTTP layer answers
/// identically either way.
pub async fn issue_reset_token(
    users: &dyn UserStore,
    tokens: &dyn ResetTokenStore,
    mailer: &dyn Mailer,
    security: &SecurityConfig,
    email: &str,
) -> Result<Option<IssuedReset>, AppError> {
    let email = normalize_email(email);

    // Lazy GC; correctness never depends on it.
    if let Ok(purged) = tokens.purge_expired(OffsetDateTime::now_utc()).await {
        if purged > 0 {
            debug!(purged, "purged expired reset tokens");
        }
    }

    if users.find_by_email(&email).await?.is_none() {
        info!(email = %email, "reset requested for unknown email; ignoring");
        return Ok(None);
    }

    let now = OffsetDateTime::now_utc();
    let record = ResetToken {
        token: generate_reset_token(),
        email: email.clone(),
        issued_at: now,
        expires_at: now + Duration::minutes(security.reset_token_ttl_minutes),
        consumed: false,
    };
    tokens.insert(&record).await?;

    let link = format!(
        "{}/reset-password?token={}",
        security.reset_link_base.trim_end_matches('/'),
        record.token
    );
    let (subject, body) = password_reset_email(&link, security.reset_token_ttl_minutes);
    let email_sent = match mailer.send(&email, &subject, &body).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, email = %email, "reset email dispatch failed; token remains valid");
            false
        }
    };

    info!(email = %email, expires_at = %record.expires_at, "reset token issued");
    Ok(Some(IssuedReset {
        token: record.token,
        expires_at: record.expires_at,
        email_sent,
    }))
}

/// Redeems a token and updates the credential. The consume flag flips via a
/// compare-and-set before the password write, so a retried or concurrent
/// redemption observes `TokenAlreadyUsed` and the token can never authorize
/// two password changes.
pub async fn redeem_reset_token(
    users: &dyn UserStore,
    tokens: &dyn ResetTokenStore,
    security: &SecurityConfig,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    // Reject a weak replacement before burning the token.
    check_password_policy(new_password, security.min_password_len)?;

    let record = tokens.find(token).await?.ok_or(AppError::InvalidToken)?;
    if record.is_expired(OffsetDateTime::now_utc()) {
        return Err(AppError::ExpiredToken);
    }
    if record.consumed {
        return Err(AppError::TokenAlreadyUsed);
    }
    if !tokens.consume(token).await? {
        // Lost the race against a concurrent redemption.
        return Err(AppError::TokenAlreadyUsed);
    }

    set_password(users, security, &record.email, new_password).await?;
    info!(email = %record.email, "password reset via token");
    Ok(())
}
