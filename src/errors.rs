// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{
    error::{JsonPayloadError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Field name (wire spelling) -> list of human readable messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message shown to visitors whenever the request never reached us
/// or the server could not be reached.
pub const CONNECTIVITY_MESSAGE: &str =
    "We couldn't reach our servers. Please check your connection or call us directly.";

/// Application-specific error types
/// DOCUMENTATION: Each variant maps to an HTTP status code and to the
/// `{ success: false, message, errors? }` body expected by the site forms
#[derive(Error, Debug)]
pub enum TowError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    ResolutionFailed(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Email delivery failed: {0}")]
    EmailDeliveryFailed(String),

    #[error("Server configuration error: {0}")]
    ConfigurationError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl TowError {
    /// Build a validation error for a single field
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        TowError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    /// Message safe to return to the browser.
    /// Server-side failures never leak their details.
    pub fn public_message(&self) -> String {
        match self {
            TowError::EmailDeliveryFailed(_) => {
                "We couldn't send your request right now. Please call us directly.".to_string()
            }
            TowError::ConfigurationError(_) => {
                "The server is not configured to accept requests right now.".to_string()
            }
            TowError::RateLimitExceeded => {
                "Too many requests. Please wait a minute and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<ValidationErrors> for TowError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        flatten_validation_errors(&errors, None, &mut fields);
        TowError::Validation {
            message: "Validation failed".to_string(),
            errors: fields,
        }
    }
}

/// Walk nested validator output into dotted camelCase keys
/// (e.g. `customer_name` -> `customerName`, `location.latitude`).
fn flatten_validation_errors(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let key = match prefix {
            Some(p) => format!("{}.{}", p, to_camel_case(field)),
            None => to_camel_case(field),
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value for {}", key))
                    })
                    .collect::<Vec<_>>();
                out.entry(key).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, Some(&key), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let indexed = format!("{}[{}]", key, index);
                    flatten_validation_errors(nested, Some(&indexed), out);
                }
            }
        }
    }
}

pub fn to_camel_case(field: &str) -> String {
    let mut result = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            result.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Convert TowError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for TowError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            TowError::Validation { message, errors } => json!({
                "success": false,
                "message": message,
                "errors": errors,
            }),
            TowError::InvalidInput(_) => json!({
                "success": false,
                "message": self.to_string(),
                "errors": {},
            }),
            _ => json!({
                "success": false,
                "message": self.public_message(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TowError::Validation { .. } => StatusCode::BAD_REQUEST,
            TowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TowError::ResolutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TowError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            TowError::EmailDeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TowError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TowError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Public message for request bodies or query strings that fail to parse
pub const INVALID_FORM_MESSAGE: &str = "Invalid form data";

/// Route malformed JSON bodies through the same error shape as validation failures
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected malformed JSON body on {}: {}", req.path(), err);
    TowError::InvalidInput(INVALID_FORM_MESSAGE.to_string()).into()
}

/// Same treatment for query strings (`?lat=abc`)
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected malformed query on {}: {}", req.path(), err);
    TowError::InvalidInput(INVALID_FORM_MESSAGE.to_string()).into()
}
