use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{ResetToken, User};

/// Persistence for user records. Insertion is put-if-absent on the email so
/// two concurrent registrations cannot both succeed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Returns None when the email is already taken.
    async fn insert_if_absent(
        &self,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>>;
    /// Returns false when no such user exists.
    async fn update_password(&self, email: &str, password_hash: &str) -> anyhow::Result<bool>;
    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()>;
}

/// Persistence for reset tokens. `consume` is the compare-and-set that
/// serializes concurrent redemptions of the same token.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn insert(&self, token: &ResetToken) -> anyhow::Result<()>;
    async fn find(&self, token: &str) -> anyhow::Result<Option<ResetToken>>;
    /// Flips `consumed` false -> true. Returns false when the token is
    /// missing or was already consumed.
    async fn consume(&self, token: &str) -> anyhow::Result<bool>;
    async fn purge_expired(&self, now: OffsetDateTime) -> anyhow::Result<u64>;
}

// --- Postgres ---

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, password_hash, created_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, password_hash, created_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert_if_absent(
        &self,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, full_name, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, full_name, password_hash, created_at, last_login
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET last_login = now() WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

pub struct PgResetTokenStore {
    db: PgPool,
}

impl PgResetTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetTokenStore for PgResetTokenStore {
    async fn insert(&self, token: &ResetToken) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reset_tokens (token, email, issued_at, expires_at, consumed)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.consumed)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find(&self, token: &str) -> anyhow::Result<Option<ResetToken>> {
        let row = sqlx::query_as::<_, ResetToken>(
            r#"
            SELECT token, email, issued_at, expires_at, consumed
            FROM reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn consume(&self, token: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reset_tokens SET consumed = TRUE
            WHERE token = $1 AND consumed = FALSE
            "#,
        )
        .bind(token)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"DELETE FROM reset_tokens WHERE expires_at < $1"#)
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

// --- In-memory (tests and AppState::fake) ---

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn insert_if_absent(
        &self,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        };
        users.insert(email.to_string(), user.clone());
        Ok(Some(user))
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> anyhow::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.id == id) {
            user.last_login = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResetTokenStore {
    tokens: Mutex<HashMap<String, ResetToken>>,
}

#[async_trait]
impl ResetTokenStore for MemoryResetTokenStore {
    async fn insert(&self, token: &ResetToken) -> anyhow::Result<()> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> anyhow::Result<Option<ResetToken>> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn consume(&self, token: &str) -> anyhow::Result<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(token) {
            Some(t) if !t.consumed => {
                t.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> anyhow::Result<u64> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }
}
