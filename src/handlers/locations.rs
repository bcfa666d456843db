// src/handlers/locations.rs
// DOCUMENTATION: HTTP handlers for address lookup and distance
// PURPOSE: Proxy the geocoder (keeps the access token server-side) and
// compute trip distance

use crate::config::Config;
use crate::errors::TowError;
use crate::models::{
    Coordinate, DistanceRequest, DistanceResponse, GeocodeQuery, LocationInfo, ReverseQuery, SuggestQuery,
};
use crate::services::{
    format_miles, haversine_miles, suggest_addresses, suggest_repair_shop, Geocoder, RegionBias,
    RequestLimiter,
};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

/// GET /api/geocode?address=
pub async fn geocode(
    geocoder: web::Data<dyn Geocoder>,
    limiter: web::Data<RequestLimiter>,
    query: web::Query<GeocodeQuery>,
) -> Result<impl Responder, TowError> {
    limiter.check_geocoding()?;

    let result = geocoder.forward(&query.address).await?;
    Ok(HttpResponse::Ok().json(json!({
        "found": result.is_some(),
        "result": result,
    })))
}

/// GET /api/suggest?q=
pub async fn suggest(
    geocoder: web::Data<dyn Geocoder>,
    limiter: web::Data<RequestLimiter>,
    config: web::Data<Config>,
    query: web::Query<SuggestQuery>,
) -> Result<impl Responder, TowError> {
    limiter.check_geocoding()?;

    let region = RegionBias::new(config.region_qualifier.clone(), config.region_name.clone());
    let suggestions = suggest_addresses(geocoder.get_ref(), &query.q, &region).await?;
    Ok(HttpResponse::Ok().json(json!({ "suggestions": suggestions })))
}

/// GET /api/reverse?lat=&lon=
pub async fn reverse(
    geocoder: web::Data<dyn Geocoder>,
    limiter: web::Data<RequestLimiter>,
    query: web::Query<ReverseQuery>,
) -> Result<impl Responder, TowError> {
    limiter.check_geocoding()?;

    let address = geocoder.reverse(Coordinate::new(query.lon, query.lat)).await?;
    Ok(HttpResponse::Ok().json(json!({ "address": address })))
}

/// GET /api/repair-shop
/// Suggested destination with its coordinate pre-resolved when possible
pub async fn repair_shop(
    geocoder: web::Data<dyn Geocoder>,
    limiter: web::Data<RequestLimiter>,
    config: web::Data<Config>,
) -> Result<impl Responder, TowError> {
    limiter.check_geocoding()?;

    let mut location = LocationInfo::default();
    suggest_repair_shop(geocoder.get_ref(), &config.repair_shop_address, &mut location).await;
    Ok(HttpResponse::Ok().json(json!({
        "address": location.to_address,
        "result": location.to_selected,
    })))
}

/// POST /api/distance
pub async fn distance(req: web::Json<DistanceRequest>) -> Result<impl Responder, TowError> {
    if !req.from.is_valid() || !req.to.is_valid() {
        return Err(TowError::InvalidInput("Coordinate out of range".to_string()));
    }

    let miles = format_miles(haversine_miles(req.from, req.to));
    Ok(HttpResponse::Ok().json(DistanceResponse { miles }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/geocode", web::get().to(geocode))
        .route("/api/suggest", web::get().to(suggest))
        .route("/api/reverse", web::get().to(reverse))
        .route("/api/repair-shop", web::get().to(repair_shop))
        .route("/api/distance", web::post().to(distance));
}
