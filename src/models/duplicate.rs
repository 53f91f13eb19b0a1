//! Duplicate lookup wire types and the state published to form UIs.

use super::record::{AttributeKey, CheckableAttributes, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An existing record the lookup service considers a likely duplicate.
///
/// Produced only by the server; the client never constructs or edits one
/// outside of tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    /// Identity of the existing record.
    pub id: i64,
    /// Display label of the existing record.
    pub name: String,
    /// Descriptions of which fields matched, in server order.
    #[serde(default)]
    pub matches: Vec<String>,
}

/// Body of a duplicate lookup request.
///
/// ```rust
/// use crmcheck::{CheckableAttributes, DuplicateCheckRequest, RecordKind};
///
/// let attrs = CheckableAttributes::for_kind(RecordKind::Company)
///     .with("name", "Acme")
///     .unwrap();
/// let request = DuplicateCheckRequest::new(&attrs, Some(7));
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["model"], "company");
/// assert_eq!(json["id"], 7);
/// assert_eq!(json["attributes"]["name"], "Acme");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCheckRequest {
    /// Record kind being checked.
    pub model: RecordKind,
    /// Identity of the record being edited, excluded from its own results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Provided attribute values.
    pub attributes: BTreeMap<AttributeKey, String>,
}

impl DuplicateCheckRequest {
    /// Builds a request from an attribute snapshot.
    #[must_use]
    pub fn new(attributes: &CheckableAttributes, id: Option<i64>) -> Self {
        Self {
            model: attributes.kind(),
            id,
            attributes: attributes.present(),
        }
    }
}

/// Body of a duplicate lookup response.
///
/// A missing or `null` `duplicates` field means no candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DuplicateCheckResponse {
    /// Candidates found by the server.
    #[serde(default)]
    pub duplicates: Option<Vec<DuplicateCandidate>>,
}

impl DuplicateCheckResponse {
    /// Consumes the response, yielding the candidate list.
    #[must_use]
    pub fn into_candidates(self) -> Vec<DuplicateCandidate> {
        self.duplicates.unwrap_or_default()
    }
}

/// What a form UI renders for a duplicate-check session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateState {
    /// Latest applied candidate list.
    pub duplicates: Vec<DuplicateCandidate>,
    /// Whether a lookup is in progress.
    pub checking: bool,
}
