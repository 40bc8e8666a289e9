//! Message delivery.
//!
//! [`SmtpMailer`] sends through `lettre`'s async SMTP transport. When
//! `SMTP_HOST` is not configured the binary falls back to [`LogMailer`], which
//! only records what would have been sent.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;
use thiserror::Error;

use super::templates::{render, TemplateKind};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Template data error: {0}")]
    Template(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        address: &str,
        template: TemplateKind,
        data: &Value,
    ) -> Result<(), DeliveryError>;
}

const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "noreply@event-ticketing.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends over one pooled STARTTLS transport built at startup.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Validates the sender address and builds the transport. No connection
    /// is opened until the first send. Must be called inside a tokio runtime.
    pub fn new(config: EmailConfig) -> Result<Self, DeliveryError> {
        let from = config.from_address.parse()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (config.smtp_user, config.smtp_password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        address: &str,
        template: TemplateKind,
        data: &Value,
    ) -> Result<(), DeliveryError> {
        let rendered = render(template, data)?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(address.parse()?)
            .subject(rendered.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(rendered.body)
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        self.transport.send(email).await?;

        tracing::info!(to = address, subject = %rendered.subject, "Email sent successfully");
        Ok(())
    }
}

/// Renders the message and logs it instead of sending.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        address: &str,
        template: TemplateKind,
        data: &Value,
    ) -> Result<(), DeliveryError> {
        let rendered = render(template, data)?;
        tracing::info!(
            to = address,
            template = template.as_str(),
            subject = %rendered.subject,
            "SMTP not configured; email logged instead of sent"
        );
        Ok(())
    }
}
