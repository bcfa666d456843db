// src/services/email_client.rs
// DOCUMENTATION: Transactional email API client
// PURPOSE: Deliver notification and confirmation emails through Resend

use crate::errors::TowError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Outgoing message in the provider's wire format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    /// Plain-text alternative for clients that do not render HTML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Anything that can deliver an email and report its provider id
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, TowError>;
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

pub struct ResendClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.resend.com".to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<String, TowError> {
        let url = format!("{}/emails", self.base_url);

        log::debug!("Sending email {:?} to {} recipient(s)", message.subject, message.to.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                log::error!("Email API request failed: {}", e);
                TowError::EmailDeliveryFailed(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Email API error {}: {}", status, body);
            return Err(TowError::EmailDeliveryFailed(format!("API error {}", status)));
        }

        let sent: SendResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse email API response: {}", e);
            TowError::EmailDeliveryFailed(format!("Parse error: {}", e))
        })?;

        Ok(sent.id)
    }
}
