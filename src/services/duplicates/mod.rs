//! Live duplicate detection for records being edited.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  check_duplicates   ┌──────────────────────┐  POST JSON  ┌────────────────┐
//! │   Form UI    │ ──────────────────> │ DuplicateCoordinator │ ──────────> │ DuplicateLookup│
//! │              │ <────────────────── │  debounce + request  │ <────────── │  (HTTP / fake) │
//! └──────────────┘   DuplicateState    │  sequencing          │  candidates └────────────────┘
//!                    (watch channel)   └──────────────────────┘
//! ```
//!
//! Duplicate checking is advisory: lookup failures are logged and clear the
//! suggestions, they never reach the caller.

mod config;
mod coordinator;
mod lookup;

pub use config::{DEFAULT_ENDPOINT, DuplicateCheckConfig, DuplicateCheckSettings};
pub use coordinator::{DuplicateCoordinator, RequestId};
pub use lookup::{DuplicateLookup, HttpDuplicateLookup};
