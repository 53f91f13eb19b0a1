//! Attribute validation schemas.
//!
//! A schema is data: a table of [`FieldRule`]s, each pairing a field with a
//! coercion and its constraints. New record kinds add a table instead of a
//! type. Validation never touches the network or shared state and never
//! stops at the first failure.
//!
//! # Example
//!
//! ```rust
//! use crmcheck::Schema;
//! use serde_json::json;
//!
//! let record = Schema::deal()
//!     .validate(&json!({
//!         "title": "Pilot",
//!         "company_id": "1",
//!         "stage": "New Lead",
//!         "probability": 100,
//!         "value": ""
//!     }))
//!     .unwrap();
//! assert!(!record.is_provided("value"));
//! ```

mod rules;
mod schema;
mod value;

pub use rules::{FieldCheck, FieldRule};
pub use schema::{DEAL_STAGES, PROBABILITY_RANGE, Schema};
pub use value::{FieldError, FieldValue, ValidatedRecord};
