// src/services/submission_client.rs
// DOCUMENTATION: Client side of the quote/contact flow
// PURPOSE: Post form state to the backend and map the reply back onto the form

use crate::errors::{FieldErrors, CONNECTIVITY_MESSAGE};
use crate::models::{ContactForm, QuoteForm};
use crate::services::pricing::{parse_miles, PricingEngine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Result of one submission attempt; never retried automatically
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Accepted; the form has been reset
    Sent { email_ids: Vec<String> },
    /// Server rejected the payload; errors keyed by wire field name
    Rejected { message: String, field_errors: FieldErrors },
    /// Transport failure or server error
    Failed { message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: FieldErrors,
    email_id: Option<String>,
    business_email_id: Option<String>,
    customer_email_id: Option<String>,
}

/// Map an HTTP reply to an outcome
pub fn interpret_response(status: StatusCode, body: &str) -> SubmissionOutcome {
    let reply: ReplyBody = serde_json::from_str(body).unwrap_or_default();

    if status.is_success() {
        let email_ids = [reply.email_id, reply.business_email_id, reply.customer_email_id]
            .into_iter()
            .flatten()
            .collect();
        return SubmissionOutcome::Sent { email_ids };
    }

    if status == StatusCode::BAD_REQUEST {
        return SubmissionOutcome::Rejected {
            message: reply
                .message
                .unwrap_or_else(|| "Please correct the highlighted fields.".to_string()),
            field_errors: reply.errors,
        };
    }

    SubmissionOutcome::Failed {
        message: reply.message.unwrap_or_else(|| CONNECTIVITY_MESSAGE.to_string()),
    }
}

pub struct SubmissionClient {
    client: Client,
    base_url: String,
}

impl SubmissionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> SubmissionOutcome {
        let url = format!("{}{}", self.base_url, path);

        let response = match self.client.post(&url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Submission to {} failed: {}", url, e);
                return SubmissionOutcome::Failed {
                    message: CONNECTIVITY_MESSAGE.to_string(),
                };
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => interpret_response(status, &body),
            Err(e) => {
                log::warn!("Failed to read submission reply: {}", e);
                SubmissionOutcome::Failed {
                    message: CONNECTIVITY_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Submit the contact form; resets it on success
    pub async fn submit_contact(&self, form: &mut ContactForm) -> SubmissionOutcome {
        let outcome = self.post("/api/contact", &form.to_request()).await;
        if matches!(outcome, SubmissionOutcome::Sent { .. }) {
            form.reset();
        }
        outcome
    }

    /// Submit the quote form with the estimate currently displayed
    pub async fn submit_quote(&self, form: &mut QuoteForm, engine: &PricingEngine) -> SubmissionOutcome {
        let estimated_total = estimate_total(form, engine);
        let outcome = self.post("/api/quote", &form.to_request(estimated_total)).await;
        if matches!(outcome, SubmissionOutcome::Sent { .. }) {
            form.reset();
        }
        outcome
    }
}

/// Total shown in the widget for the current form state; zero until a
/// service is picked
pub fn estimate_total(form: &QuoteForm, engine: &PricingEngine) -> f64 {
    match form.service_type {
        Some(service) => {
            engine
                .estimate(
                    service,
                    parse_miles(&form.location.miles),
                    form.vehicle.is_large,
                    &form.discounts,
                )
                .total
        }
        None => 0.0,
    }
}
