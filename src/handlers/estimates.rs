// src/handlers/estimates.rs
// DOCUMENTATION: HTTP handler for the cost calculator
// PURPOSE: Server-side rendition of the estimate widget

use crate::errors::TowError;
use crate::models::EstimateRequest;
use crate::services::PricingEngine;
use actix_web::{web, HttpResponse, Responder};

/// POST /api/estimate
pub async fn estimate(
    engine: web::Data<PricingEngine>,
    req: web::Json<EstimateRequest>,
) -> Result<impl Responder, TowError> {
    let breakdown = engine.estimate_from_input(
        req.service_type,
        &req.miles,
        req.is_large_vehicle,
        &req.discounts(),
    );
    Ok(HttpResponse::Ok().json(breakdown))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/estimate", web::post().to(estimate));
}
