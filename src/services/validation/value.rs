//! Validated values and field errors.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A coerced field value.
///
/// `NotProvided` is distinct from an empty string and serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Non-empty text.
    Text(String),
    /// A finite number.
    Number(f64),
    /// A record identity.
    Id(i64),
    /// A calendar date.
    Date(NaiveDate),
    /// The field was absent, null, or blank.
    NotProvided,
}

impl FieldValue {
    /// Returns true unless the value is [`FieldValue::NotProvided`].
    #[must_use]
    pub const fn is_provided(&self) -> bool {
        !matches!(self, Self::NotProvided)
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the violation belongs to.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The coerced, constraint-checked form of a record payload.
///
/// Contains exactly one entry per rule of the schema that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    /// Name of the schema that produced this record.
    pub schema: &'static str,
    /// Coerced values keyed by field name.
    pub fields: BTreeMap<&'static str, FieldValue>,
}

impl ValidatedRecord {
    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns a text field's value, if provided.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns a numeric field's value, if provided.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns an identity field's value, if provided.
    #[must_use]
    pub fn id(&self, field: &str) -> Option<i64> {
        match self.get(field) {
            Some(FieldValue::Id(id)) => Some(*id),
            _ => None,
        }
    }

    /// Returns a date field's value, if provided.
    #[must_use]
    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        match self.get(field) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Returns true if the field exists and was provided.
    #[must_use]
    pub fn is_provided(&self, field: &str) -> bool {
        self.get(field).is_some_and(FieldValue::is_provided)
    }
}
