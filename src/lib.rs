//! # crmcheck
//!
//! Live duplicate detection and field validation for CRM record forms.
//!
//! The crate has two independent halves that a form front end consults:
//!
//! - [`DuplicateCoordinator`] watches the checkable attributes of a company
//!   or contact while the user types, debounces the edits, asks a lookup
//!   service whether similar records exist, and publishes the answer without
//!   ever letting a superseded response overwrite fresher state.
//! - [`Schema`] is a declarative table of field rules that mirrors the
//!   server-side validation contract, collecting every field error at once.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crmcheck::{CheckableAttributes, DuplicateCoordinator, HttpDuplicateLookup, RecordKind};
//!
//! let lookup = HttpDuplicateLookup::new(&config.duplicates)?;
//! let coordinator = DuplicateCoordinator::new(RecordKind::Company, None, lookup, &config.duplicates)?;
//!
//! let attributes = CheckableAttributes::for_kind(RecordKind::Company)
//!     .with("name", "Acme Corp")?;
//! coordinator.check_duplicates(attributes);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod models;
pub mod observability;
pub mod services;

pub use config::CrmCheckConfig;
pub use models::{
    AttributeKey, CheckableAttributes, DuplicateCandidate, DuplicateCheckRequest,
    DuplicateCheckResponse, DuplicateState, RecordKind,
};
pub use services::duplicates::{
    DuplicateCheckConfig, DuplicateCoordinator, DuplicateLookup, HttpDuplicateLookup,
};
pub use services::validation::{FieldError, FieldValue, Schema, ValidatedRecord};

/// Error type for crmcheck operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Unknown record kind or schema, attribute outside the kind's key set, malformed payload |
/// | `OperationFailed` | Config file I/O or parse errors, logging init failures |
/// | `Lookup` | The duplicate lookup service could not be reached or answered badly |
///
/// Field validation failures are not errors; see [`Schema::validate`].
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A duplicate lookup did not produce a usable answer.
    ///
    /// Raised when:
    /// - The connection fails or times out
    /// - The service answers with a non-success status
    /// - The response body is not the expected JSON shape
    #[error("duplicate lookup failed{}: {cause}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Lookup {
        /// HTTP status code, when the service answered at all.
        status: Option<u16>,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for crmcheck operations.
pub type Result<T> = std::result::Result<T, Error>;
