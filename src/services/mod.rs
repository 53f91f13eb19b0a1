//! Business logic services.
//!
//! - [`duplicates`]: debounced, stale-safe duplicate lookups while a record is edited
//! - [`validation`]: declarative field rules for record payloads

pub mod duplicates;
pub mod validation;
