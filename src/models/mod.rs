//! Data models for crmcheck.

mod duplicate;
mod record;

pub use duplicate::{
    DuplicateCandidate, DuplicateCheckRequest, DuplicateCheckResponse, DuplicateState,
};
pub use record::{AttributeKey, CheckableAttributes, RecordKind};
