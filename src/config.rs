use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Knobs for the credential and reset-token lifecycle. All defaulted; the
/// core only consumes these, it never writes them.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub min_password_len: usize,
    /// Argon2 time cost (iteration count) used when hashing passwords.
    pub kdf_time_cost: u32,
    pub reset_token_ttl_minutes: i64,
    /// Base URL embedded in password-reset links.
    pub reset_link_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    /// None when SMTP is not configured; outgoing mail is then logged only.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "attar-travel".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "attar-travel-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let security = SecurityConfig {
            min_password_len: std::env::var("MIN_PASSWORD_LEN")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(8),
            kdf_time_cost: std::env::var("KDF_TIME_COST")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(2),
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            reset_link_base: std::env::var("RESET_LINK_BASE")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
        };
        let smtp = match (
            std::env::var("SMTP_SERVER").ok(),
            std::env::var("SMTP_USERNAME").ok(),
            std::env::var("SMTP_PASSWORD").ok(),
        ) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                from_email: std::env::var("SMTP_FROM_EMAIL")
                    .unwrap_or_else(|_| username.clone()),
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
                host,
                username,
                password,
            }),
            _ => None,
        };
        Ok(Self {
            database_url,
            jwt,
            security,
            smtp,
        })
    }
}
