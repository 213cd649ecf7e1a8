// Notifier and mail transport traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::trends::AlertEvent;

/// A single delivery failure. Collected per event; never aborts the batch.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("could not build message: {0}")]
    Message(String),

    #[error("{transport} delivery failed: {detail}")]
    Delivery {
        transport: &'static str,
        detail: String,
    },
}

/// A rendered email, independent of how it gets sent.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivers rendered emails. One implementation per provider.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name for logs ("smtp", "sendgrid").
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Sends one alert event to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}
