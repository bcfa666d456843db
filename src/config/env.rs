// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8080)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Mapbox access token used for geocoding and suggestions
    pub mapbox_access_token: String,

    /// API key for the transactional email provider
    pub resend_api_key: String,

    /// Inbox that receives contact and quote notifications
    pub business_email: String,

    /// Sender address on outgoing email
    pub from_email: String,

    /// State abbreviation appended to autocomplete queries (e.g. "AZ")
    pub region_qualifier: String,

    /// Full state name, also treated as a state-like token
    pub region_name: String,

    /// Proximity bias for the geocoder, longitude first
    pub proximity: (f64, f64),

    /// Destination offered by the "suggest a repair shop" action
    pub repair_shop_address: String,

    /// TTL of cached geocoder responses
    pub geocode_cache_ttl_seconds: u64,

    /// Contact/quote submissions allowed per client IP per minute
    pub submissions_per_minute: u32,

    /// Geocoding proxy requests allowed per minute (all clients)
    pub geocode_requests_per_minute: u32,
}

pub const DEFAULT_REPAIR_SHOP: &str = "8625 E. McDowell Road Scottsdale, AZ";

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        dotenv().ok();

        Config {
            server_address: var_or("SERVER_ADDRESS", "127.0.0.1"),
            server_port: parsed_or("SERVER_PORT", 8080),
            environment: var_or("ENVIRONMENT", "development"),
            log_level: var_or("LOG_LEVEL", "info"),
            mapbox_access_token: var_or("MAPBOX_ACCESS_TOKEN", ""),
            resend_api_key: var_or("RESEND_API_KEY", ""),
            business_email: var_or("BUSINESS_EMAIL", ""),
            from_email: var_or("FROM_EMAIL", "Quotes <quotes@example.com>"),
            region_qualifier: var_or("REGION_QUALIFIER", "AZ"),
            region_name: var_or("REGION_NAME", "Arizona"),
            proximity: (
                parsed_or("PROXIMITY_LON", -112.074),
                parsed_or("PROXIMITY_LAT", 33.4484),
            ),
            repair_shop_address: var_or("REPAIR_SHOP_ADDRESS", DEFAULT_REPAIR_SHOP),
            geocode_cache_ttl_seconds: parsed_or("GEOCODE_CACHE_TTL_SECONDS", 3600),
            submissions_per_minute: parsed_or("SUBMISSIONS_PER_MINUTE", 5),
            geocode_requests_per_minute: parsed_or("GEOCODE_REQUESTS_PER_MINUTE", 120),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Missing secrets are not fatal; the endpoints that
    /// need them answer with an opaque 500 instead
    pub fn validate(&self) -> Result<(), String> {
        if self.server_address.is_empty() {
            return Err("SERVER_ADDRESS is required".to_string());
        }

        if self.submissions_per_minute == 0 || self.geocode_requests_per_minute == 0 {
            return Err("Rate limits must be greater than zero".to_string());
        }

        if self.mapbox_access_token.is_empty() {
            log::warn!("MAPBOX_ACCESS_TOKEN not configured - geocoding will not work");
        }

        if self.resend_api_key.is_empty() || self.business_email.is_empty() {
            log::warn!("RESEND_API_KEY or BUSINESS_EMAIL not configured - submissions will fail");
        }

        Ok(())
    }

    pub fn email_configured(&self) -> bool {
        !self.resend_api_key.is_empty() && !self.business_email.is_empty()
    }
}

#[cfg(test)]
impl Config {
    /// Configuration with every secret present, for handler tests
    pub fn for_tests() -> Self {
        Config {
            server_address: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            mapbox_access_token: "test-token".to_string(),
            resend_api_key: "re_test".to_string(),
            business_email: "dispatch@example.com".to_string(),
            from_email: "Quotes <quotes@example.com>".to_string(),
            region_qualifier: "AZ".to_string(),
            region_name: "Arizona".to_string(),
            proximity: (-112.074, 33.4484),
            repair_shop_address: DEFAULT_REPAIR_SHOP.to_string(),
            geocode_cache_ttl_seconds: 60,
            submissions_per_minute: 100,
            geocode_requests_per_minute: 100,
        }
    }
}
