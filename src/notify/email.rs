// EmailNotifier — format an alert and deliver it over a MailTransport.

use async_trait::async_trait;
use tracing::info;

use super::format;
use super::traits::{MailTransport, Notifier, NotifyError};
use crate::trends::AlertEvent;

pub struct EmailNotifier {
    transport: Box<dyn MailTransport>,
    recipient: String,
}

impl EmailNotifier {
    pub fn new(transport: Box<dyn MailTransport>, recipient: impl Into<String>) -> Self {
        Self {
            transport,
            recipient: recipient.into(),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let message = format::render_alert(event, &self.recipient);
        self.transport.deliver(&message).await?;
        info!(
            post_id = %event.post_id,
            kind = %event.kind,
            transport = self.transport.name(),
            "Alert email sent"
        );
        Ok(())
    }
}
