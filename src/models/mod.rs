// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod location;
pub mod pricing;
pub mod submission;

pub use location::*;
pub use pricing::*;
pub use submission::*;
