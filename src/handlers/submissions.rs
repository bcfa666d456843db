// src/handlers/submissions.rs
// DOCUMENTATION: HTTP handlers for contact and quote forms
// PURPOSE: Throttle, validate, dispatch; errors render as
// { success: false, message, errors? }

use crate::errors::TowError;
use crate::models::{ContactRequest, QuoteRequest};
use crate::services::{RequestLimiter, SubmissionService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};

/// Throttling key for the caller
pub fn client_key(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// POST /api/contact
pub async fn submit_contact(
    req: HttpRequest,
    service: web::Data<SubmissionService>,
    limiter: web::Data<RequestLimiter>,
    body: web::Json<ContactRequest>,
) -> Result<impl Responder, TowError> {
    limiter.check_submission(&client_key(&req))?;

    let response = service.submit_contact(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/quote
pub async fn submit_quote(
    req: HttpRequest,
    service: web::Data<SubmissionService>,
    limiter: web::Data<RequestLimiter>,
    body: web::Json<QuoteRequest>,
) -> Result<impl Responder, TowError> {
    limiter.check_submission(&client_key(&req))?;

    let response = service.submit_quote(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Configuration for submission routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/contact", web::post().to(submit_contact))
        .route("/api/quote", web::post().to(submit_quote));
}
