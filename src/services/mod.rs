// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod address_resolver;
pub mod cache;
pub mod email_client;
pub mod geocoding_client;
pub mod geodesy;
pub mod geolocation;
pub mod ip_locator;
pub mod pricing;
pub mod rate_limiter;
pub mod submission_client;
pub mod submission_service;

pub use address_resolver::*;
pub use cache::*;
pub use email_client::*;
pub use geocoding_client::*;
pub use geodesy::*;
pub use geolocation::*;
pub use ip_locator::*;
pub use pricing::*;
pub use rate_limiter::*;
pub use submission_client::*;
pub use submission_service::*;
