// src/services/submission_service.rs
// DOCUMENTATION: Business logic for contact and quote submissions
// PURPOSE: Validate form payloads and dispatch notification emails

use crate::config::Config;
use crate::errors::TowError;
use crate::models::{ContactRequest, ContactResponse, QuoteRequest, QuoteResponse};
use crate::services::email_client::{EmailMessage, EmailSender, ResendClient};
use crate::services::pricing::format_currency;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Escape user text before embedding it in an HTML email
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:4px 12px 4px 0\"><strong>{}</strong></td><td>{}</td></tr>",
        label,
        escape_html(value)
    )
}

fn html_rows(fields: &[(&str, String)]) -> String {
    fields.iter().map(|(label, value)| row(label, value)).collect()
}

/// Plain-text counterpart of `html_rows`
fn text_lines(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub struct SubmissionService {
    /// None when the email provider is not configured
    sender: Option<Arc<dyn EmailSender>>,
    business_email: String,
    from_email: String,
}

impl SubmissionService {
    pub fn new(sender: Option<Arc<dyn EmailSender>>, business_email: String, from_email: String) -> Self {
        Self {
            sender,
            business_email,
            from_email,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let sender: Option<Arc<dyn EmailSender>> = if config.email_configured() {
            Some(Arc::new(ResendClient::new(config.resend_api_key.clone())))
        } else {
            None
        };
        Self::new(sender, config.business_email.clone(), config.from_email.clone())
    }

    fn sender(&self) -> Result<&Arc<dyn EmailSender>, TowError> {
        match &self.sender {
            Some(sender) if !self.business_email.is_empty() => Ok(sender),
            _ => {
                log::error!("Submission received but email delivery is not configured");
                Err(TowError::ConfigurationError(
                    "RESEND_API_KEY or BUSINESS_EMAIL missing".to_string(),
                ))
            }
        }
    }

    /// Handle POST /api/contact
    pub async fn submit_contact(&self, req: ContactRequest) -> Result<ContactResponse, TowError> {
        req.validate()?;
        let sender = self.sender()?;

        let reference = Uuid::new_v4();
        let message = self.contact_email(&req, reference);
        let email_id = sender.send(&message).await?;

        log::info!("Contact request {} dispatched (email {})", reference, email_id);

        Ok(ContactResponse {
            success: true,
            email_id: Some(email_id),
        })
    }

    /// Handle POST /api/quote
    /// DOCUMENTATION: The business notification is required; the customer
    /// confirmation is best effort and only sent when an email was given
    pub async fn submit_quote(&self, req: QuoteRequest) -> Result<QuoteResponse, TowError> {
        req.validate()?;
        let sender = self.sender()?;

        let reference = Uuid::new_v4();
        let business = self.quote_business_email(&req, reference);
        let business_email_id = sender.send(&business).await?;

        log::info!("Quote request {} dispatched (email {})", reference, business_email_id);

        let customer_email_id = match self.quote_customer_email(&req, reference) {
            Some(confirmation) => match sender.send(&confirmation).await {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("Customer confirmation for quote {} failed: {}", reference, e);
                    None
                }
            },
            None => None,
        };

        Ok(QuoteResponse {
            success: true,
            business_email_id: Some(business_email_id),
            customer_email_id,
        })
    }

    fn contact_email(&self, req: &ContactRequest, reference: Uuid) -> EmailMessage {
        let fields = vec![
            ("Name", req.name.clone()),
            ("Phone", req.phone.clone()),
            ("Email", req.email.clone().unwrap_or_else(|| "Not provided".to_string())),
            ("Received", Utc::now().to_rfc2822()),
            ("Reference", reference.to_string()),
        ];

        let html = format!(
            "<h2>New contact request</h2><table>{}</table><p>{}</p>",
            html_rows(&fields),
            escape_html(&req.message).replace('\n', "<br>"),
        );
        let text = format!("New contact request\n\n{}\n\n{}", text_lines(&fields), req.message);

        EmailMessage {
            from: self.from_email.clone(),
            to: vec![self.business_email.clone()],
            subject: format!("New contact request from {}", req.name),
            html,
            text: Some(text),
            reply_to: req.email.clone().filter(|e| !e.is_empty()),
        }
    }

    fn quote_business_email(&self, req: &QuoteRequest, reference: Uuid) -> EmailMessage {
        let service = req.service.map(|s| s.label()).unwrap_or("Unknown service");

        let mut fields = vec![
            ("Service", service.to_string()),
            ("Pickup", req.from_address.clone()),
            ("Destination", req.to_address.clone()),
            ("Distance", format!("{} miles", req.miles)),
            (
                "Vehicle",
                format!("{} {} {}", req.vehicle_year, req.vehicle_make, req.vehicle_model),
            ),
            (
                "Plate",
                format!("{} ({})", req.vehicle_plate, req.vehicle_registration_state),
            ),
            ("Large vehicle", yes_no(req.is_large_vehicle).to_string()),
            ("Veteran", yes_no(req.is_veteran).to_string()),
            ("Student", yes_no(req.is_student).to_string()),
            ("Estimated total", format_currency(req.estimated_total)),
            ("Customer", req.customer_name.clone()),
            ("Phone", req.customer_phone.clone()),
            (
                "Email",
                req.customer_email.clone().unwrap_or_else(|| "Not provided".to_string()),
            ),
            ("Reference", reference.to_string()),
        ];

        if let Some(location) = &req.location {
            fields.push((
                "Shared location",
                format!("{:.6}, {:.6}", location.latitude, location.longitude),
            ));
            if let Some(accuracy) = location.accuracy.as_deref().filter(|a| !a.is_empty()) {
                fields.push(("Accuracy", accuracy.to_string()));
            }
            if !location.google_maps_link.is_empty() {
                fields.push(("Map", location.google_maps_link.clone()));
            }
        }

        let mut html = format!(
            "<h2>New {} quote request</h2><table>{}</table>",
            escape_html(service),
            html_rows(&fields)
        );
        let mut text = format!("New {} quote request\n\n{}", service, text_lines(&fields));

        if let Some(message) = req.message.as_deref().filter(|m| !m.trim().is_empty()) {
            html.push_str(&format!("<p>{}</p>", escape_html(message).replace('\n', "<br>")));
            text.push_str(&format!("\n\nMessage:\n{}", message));
        }

        EmailMessage {
            from: self.from_email.clone(),
            to: vec![self.business_email.clone()],
            subject: format!(
                "Quote request: {} for {} ({})",
                service,
                req.customer_name,
                format_currency(req.estimated_total)
            ),
            html,
            text: Some(text),
            reply_to: req.customer_email.clone().filter(|e| !e.trim().is_empty()),
        }
    }

    fn quote_customer_email(&self, req: &QuoteRequest, reference: Uuid) -> Option<EmailMessage> {
        let to = req.customer_email.as_ref().filter(|e| !e.trim().is_empty())?;
        let service = req.service.map(|s| s.label()).unwrap_or("service");

        let fields = vec![
            ("Pickup", req.from_address.clone()),
            ("Destination", req.to_address.clone()),
            ("Estimated total", format_currency(req.estimated_total)),
        ];
        let disclaimer = "Estimates are based on straight-line distance; the final price is confirmed by phone.";

        let html = format!(
            "<p>Hi {},</p><p>Thanks for requesting a {} quote. Our dispatcher will call you at {} shortly.</p>\
             <table>{}</table><p>{}</p>",
            escape_html(&req.customer_name),
            escape_html(service),
            escape_html(&req.customer_phone),
            html_rows(&fields),
            disclaimer,
        );
        let text = format!(
            "Hi {},\n\nThanks for requesting a {} quote. Our dispatcher will call you at {} shortly.\n\n{}\n\n{}",
            req.customer_name,
            service,
            req.customer_phone,
            text_lines(&fields),
            disclaimer,
        );

        Some(EmailMessage {
            from: self.from_email.clone(),
            to: vec![to.clone()],
            subject: format!("Your {} quote (ref {})", service, &reference.to_string()[..8]),
            html,
            text: Some(text),
            reply_to: Some(self.business_email.clone()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ServiceType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records messages instead of sending them
    #[derive(Default)]
    pub(crate) struct RecordingSender {
        pub(crate) sent: Mutex<Vec<EmailMessage>>,
        /// Fail every message addressed to this recipient
        pub(crate) fail_for: Option<String>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: &EmailMessage) -> Result<String, TowError> {
            if self.fail_for.as_ref().map_or(false, |r| message.to.contains(r)) {
                return Err(TowError::EmailDeliveryFailed("rejected".to_string()));
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            Ok(format!("email-{}", sent.len()))
        }
    }

    fn service(sender: Arc<RecordingSender>) -> SubmissionService {
        SubmissionService::new(
            Some(sender),
            "dispatch@example.com".to_string(),
            "Quotes <quotes@example.com>".to_string(),
        )
    }

    pub(crate) fn valid_quote() -> QuoteRequest {
        QuoteRequest {
            service: Some(ServiceType::Towing),
            from_address: "100 W Washington St, Phoenix, AZ".to_string(),
            to_address: "20 E Main St, Mesa, AZ".to_string(),
            miles: "14.6".to_string(),
            vehicle_year: "2018".to_string(),
            vehicle_make: "Ford".to_string(),
            vehicle_model: "F-150".to_string(),
            vehicle_plate: "ABC1234".to_string(),
            vehicle_registration_state: "AZ".to_string(),
            estimated_total: 197.6,
            customer_name: "Jordan Smith".to_string(),
            customer_phone: "(602) 555-0199".to_string(),
            customer_email: Some("jordan@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
    }

    #[tokio::test]
    async fn test_contact_dispatches_one_email() {
        let sender = Arc::new(RecordingSender::default());
        let response = service(sender.clone())
            .submit_contact(ContactRequest {
                name: "Jordan".to_string(),
                phone: "602-555-0199".to_string(),
                email: Some("jordan@example.com".to_string()),
                message: "Do you tow motorcycles?".to_string(),
            })
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.email_id.as_deref(), Some("email-1"));
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_to.as_deref(), Some("jordan@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_contact_sends_nothing() {
        let sender = Arc::new(RecordingSender::default());
        let err = service(sender.clone())
            .submit_contact(ContactRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TowError::Validation { .. }));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quote_sends_business_and_customer_emails() {
        let sender = Arc::new(RecordingSender::default());
        let response = service(sender.clone()).submit_quote(valid_quote()).await.unwrap();

        assert_eq!(response.business_email_id.as_deref(), Some("email-1"));
        assert_eq!(response.customer_email_id.as_deref(), Some("email-2"));
        let sent = sender.sent.lock().unwrap();
        assert!(sent[0].subject.contains("$197.60"));
        assert_eq!(sent[1].to, vec!["jordan@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_emails_carry_plain_text_bodies() {
        let sender = Arc::new(RecordingSender::default());
        let mut quote = valid_quote();
        quote.message = Some("Car is in the <garage>".to_string());
        service(sender.clone()).submit_quote(quote).await.unwrap();

        let sent = sender.sent.lock().unwrap();
        let business = sent[0].text.as_deref().unwrap();
        assert!(business.contains("Plate: ABC1234 (AZ)"));
        assert!(business.contains("Estimated total: $197.60"));
        assert!(business.contains("Car is in the <garage>"));
        assert!(!business.contains("<td"));

        let confirmation = sent[1].text.as_deref().unwrap();
        assert!(confirmation.starts_with("Hi Jordan Smith,"));
    }

    #[tokio::test]
    async fn test_customer_email_failure_is_not_fatal() {
        let sender = Arc::new(RecordingSender {
            fail_for: Some("jordan@example.com".to_string()),
            ..Default::default()
        });
        let response = service(sender).submit_quote(valid_quote()).await.unwrap();

        assert!(response.success);
        assert!(response.business_email_id.is_some());
        assert!(response.customer_email_id.is_none());
    }

    #[tokio::test]
    async fn test_business_email_failure_is_an_error() {
        let sender = Arc::new(RecordingSender {
            fail_for: Some("dispatch@example.com".to_string()),
            ..Default::default()
        });
        let err = service(sender).submit_quote(valid_quote()).await.unwrap_err();
        assert!(matches!(err, TowError::EmailDeliveryFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_email_config_is_configuration_error() {
        let service = SubmissionService::new(None, String::new(), String::new());
        let err = service.submit_quote(valid_quote()).await.unwrap_err();
        assert!(matches!(err, TowError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_user_input_is_escaped_in_email() {
        let sender = Arc::new(RecordingSender::default());
        let mut quote = valid_quote();
        quote.message = Some("<script>alert(1)</script>".to_string());
        service(sender.clone()).submit_quote(quote).await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert!(!sent[0].html.contains("<script>"));
        assert!(sent[0].html.contains("&lt;script&gt;"));
    }
}
