// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, shared services, and start HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use towquote::config::Config;
use towquote::errors::{json_error_handler, query_error_handler};
use towquote::handlers;
use towquote::models::Coordinate;
use towquote::services::{
    start_cleanup_task, GeocodeCache, Geocoder, MapboxGeocoder, PricingEngine, RequestLimiter,
    SubmissionService,
};

/// Seconds between sweeps of expired cache entries and idle limiter keys
const CLEANUP_INTERVAL_SECONDS: u64 = 300;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting towquote service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Geocoder with response cache
    let cache = Arc::new(GeocodeCache::new(config.geocode_cache_ttl_seconds));
    log::info!(
        "Initialized geocoding cache (TTL: {}s)",
        config.geocode_cache_ttl_seconds
    );
    start_cleanup_task(cache.clone(), CLEANUP_INTERVAL_SECONDS);

    let (proximity_lon, proximity_lat) = config.proximity;
    let geocoder: Arc<dyn Geocoder> = Arc::new(
        MapboxGeocoder::new_with_cache(config.mapbox_access_token.clone(), cache)
            .with_proximity(Coordinate::new(proximity_lon, proximity_lat)),
    );

    // 5. Submissions, pricing, throttling
    let submissions = web::Data::new(SubmissionService::from_config(&config));
    let pricing = web::Data::new(PricingEngine::default());
    let limiter = web::Data::new(RequestLimiter::new(
        config.submissions_per_minute,
        config.geocode_requests_per_minute,
    ));

    let sweeper = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            sweeper.cleanup();
        }
    });

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_data = web::Data::new(config);
    let geocoder_data: web::Data<dyn Geocoder> = web::Data::from(geocoder);

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(config_data.clone())
            .app_data(geocoder_data.clone())
            .app_data(submissions.clone())
            .app_data(pricing.clone())
            .app_data(limiter.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::estimates_config)
            .configure(handlers::locations_config)
            .configure(handlers::submissions_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
