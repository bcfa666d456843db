// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod estimates;
pub mod health;
pub mod locations;
pub mod submissions;

pub use estimates::config as estimates_config;
pub use health::config as health_config;
pub use locations::config as locations_config;
pub use submissions::config as submissions_config;
