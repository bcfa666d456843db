// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Shared modules for the server and CLI binaries

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
