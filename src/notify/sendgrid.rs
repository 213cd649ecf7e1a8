// SendGrid transport — HTTP API with a verified sender.
//
// API docs: https://www.twilio.com/docs/sendgrid/api-reference/mail-send/mail-send

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::traits::{EmailMessage, MailTransport, NotifyError};

pub const DEFAULT_SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

pub struct SendGridTransport {
    client: Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl SendGridTransport {
    pub fn new(api_key: String, from: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            from,
            endpoint: DEFAULT_SENDGRID_URL.to_string(),
        })
    }
}

#[async_trait]
impl MailTransport for SendGridTransport {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let request = build_request(&self.from, message);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery {
                transport: "sendgrid",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery {
                transport: "sendgrid",
                detail: format!("{status}: {body}"),
            });
        }

        Ok(())
    }
}

/// Build the mail/send request body.
pub fn build_request<'a>(from: &'a str, message: &'a EmailMessage) -> SendGridRequest<'a> {
    SendGridRequest {
        personalizations: vec![Personalization {
            to: vec![Address { email: &message.to }],
        }],
        from: Address { email: from },
        subject: &message.subject,
        content: vec![
            Content {
                kind: "text/plain",
                value: &message.text_body,
            },
            Content {
                kind: "text/html",
                value: &message.html_body,
            },
        ],
    }
}

// --- SendGrid request types ---

#[derive(Debug, Serialize)]
pub struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}
