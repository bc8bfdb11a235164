use anyhow::Context;
use axum::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::bookings::repo_types::Booking;
use crate::config::SmtpConfig;

/// Outbound email, best-effort. A send failure is reported to the caller
/// but never rolls back the mutation that triggered it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("smtp relay")?
            .port(cfg.port)
            .credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ))
            .build();
        let from = cfg
            .from_email
            .parse::<Mailbox>()
            .context("invalid SMTP_FROM_EMAIL")?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>().context("recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("build message")?;
        self.transport.send(message).await.context("smtp send")?;
        info!(%to, %subject, "email sent");
        Ok(())
    }
}

/// Fallback used when SMTP is not configured: the message is logged so the
/// flow stays observable in development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> anyhow::Result<()> {
        info!(%to, %subject, "SMTP not configured; email logged only");
        Ok(())
    }
}

pub fn password_reset_email(reset_link: &str, ttl_minutes: i64) -> (String, String) {
    let subject = "Password Reset Request - Attar Travel".to_string();
    let body = format!(
        r#"<html><body style="font-family: Arial, sans-serif; color: #333;">
<h2>Attar Travel — Password Reset</h2>
<p>We received a request to reset the password for your Attar Travel account.</p>
<p><a href="{link}">Reset your password</a></p>
<p>Or copy this link into your browser:<br>{link}</p>
<ul>
  <li>This link expires in {ttl} minutes.</li>
  <li>If you did not request a reset, ignore this email; your password is unchanged.</li>
</ul>
<p>Alex &amp; Attar Travel Team</p>
</body></html>"#,
        link = reset_link,
        ttl = ttl_minutes,
    );
    (subject, body)
}

pub fn booking_confirmation_email(booking: &Booking) -> (String, String) {
    let subject = "Travel Booking Confirmation - Attar Travel".to_string();
    let body = format!(
        r#"<html><body style="font-family: Arial, sans-serif; color: #333;">
<h2>Attar Travel — Booking Confirmed</h2>
<p>Dear Valued Customer, your travel booking has been <strong>confirmed</strong>.</p>
<table>
  <tr><td><strong>Booking ID:</strong></td><td>{id}</td></tr>
  <tr><td><strong>Service:</strong></td><td>{service}</td></tr>
  <tr><td><strong>Destination:</strong></td><td>{destination}</td></tr>
  <tr><td><strong>Departure:</strong></td><td>{departure}</td></tr>
  <tr><td><strong>Return:</strong></td><td>{ret}</td></tr>
  <tr><td><strong>Travelers:</strong></td><td>{travelers}</td></tr>
  <tr><td><strong>Total:</strong></td><td>{total:.2}</td></tr>
</table>
<p>Travel documents will be provided 24-48 hours before departure.</p>
<p>Happy Travels!<br>Alex &amp; Attar Travel Team</p>
</body></html>"#,
        id = booking.id,
        service = booking.service_type,
        destination = booking.destination,
        departure = booking.departure_date,
        ret = booking
            .return_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".into()),
        travelers = booking.num_travelers,
        total = booking.total_amount,
    );
    (subject, body)
}
