use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed in JSON
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

/// Single-use password-reset token. Expiry is checked lazily at redemption;
/// `consumed` flips exactly once via a compare-and-set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResetToken {
    pub token: String,
    pub email: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub consumed: bool,
}

impl ResetToken {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}
