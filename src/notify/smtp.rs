// SMTP transport (Gmail, Outlook, any authenticated relay).
//
// Port 465 uses implicit TLS; any other port negotiates STARTTLS.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::traits::{EmailMessage, MailTransport, NotifyError};

/// Port that expects TLS from the first byte instead of STARTTLS.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Connection settings for an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address; defaults to the username when not configured
    pub from: String,
    pub timeout: Duration,
}

pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .with_context(|| format!("Invalid SMTP host {}", settings.host))?;

        let mailer = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        let from: Mailbox = settings
            .from
            .parse()
            .with_context(|| format!("Invalid sender address {}", settings.from))?;

        debug!(host = %settings.host, port = settings.port, "SMTP transport configured");

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| NotifyError::Message(format!("invalid recipient {}: {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery {
                transport: "smtp",
                detail: e.to_string(),
            })?;

        Ok(())
    }
}
