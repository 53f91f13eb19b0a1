//! Record kinds and the attributes a form can submit for duplicate checking.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of CRM record being edited.
///
/// Serialized as the lookup service's `model` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A company (organization) record.
    Company,
    /// A contact (person) record.
    Contact,
}

impl RecordKind {
    /// Returns the closed set of attribute keys checkable for this kind.
    #[must_use]
    pub const fn attribute_keys(self) -> &'static [AttributeKey] {
        match self {
            Self::Company => &[
                AttributeKey::Name,
                AttributeKey::Email,
                AttributeKey::Website,
                AttributeKey::Phone,
            ],
            Self::Contact => &[
                AttributeKey::FirstName,
                AttributeKey::LastName,
                AttributeKey::Email,
                AttributeKey::Phone,
            ],
        }
    }

    /// Returns true if `key` belongs to this kind's attribute set.
    #[must_use]
    pub fn accepts(self, key: AttributeKey) -> bool {
        self.attribute_keys().contains(&key)
    }

    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Contact => "contact",
        }
    }

    /// Parses a kind name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "company" | "companies" => Some(Self::Company),
            "contact" | "contacts" => Some(Self::Contact),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute that can identify a likely duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    /// Company display name.
    Name,
    /// Email address.
    Email,
    /// Company website.
    Website,
    /// Phone number.
    Phone,
    /// Contact given name.
    FirstName,
    /// Contact family name.
    LastName,
}

impl AttributeKey {
    /// Returns the wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Website => "website",
            Self::Phone => "phone",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "website" => Some(Self::Website),
            "phone" => Some(Self::Phone),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the checkable attributes of a record being edited.
///
/// Keys are restricted to the record kind's set. A value that is absent or
/// whitespace-only counts as "not provided".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckableAttributes {
    kind: RecordKind,
    values: BTreeMap<AttributeKey, String>,
}

impl CheckableAttributes {
    /// Creates an empty snapshot for a record kind.
    #[must_use]
    pub const fn for_kind(kind: RecordKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Builds a snapshot from a JSON object of `key: string | null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the value is not an object, a key is
    /// outside the kind's set, or a value is neither a string nor null.
    pub fn from_json(kind: RecordKind, value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("attributes must be a JSON object".to_string()))?;

        let mut attributes = Self::for_kind(kind);
        for (key, raw) in object {
            let value = match raw {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => {
                    return Err(Error::InvalidInput(format!(
                        "attribute '{key}' must be a string or null, got {other}"
                    )));
                },
            };
            attributes.set(key, value)?;
        }
        Ok(attributes)
    }

    /// Sets or clears an attribute by wire name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is unknown or not checkable
    /// for this record kind.
    pub fn set(&mut self, key: &str, value: Option<impl Into<String>>) -> Result<()> {
        let key = AttributeKey::parse(key)
            .filter(|k| self.kind.accepts(*k))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "'{key}' is not a checkable attribute of a {}",
                    self.kind
                ))
            })?;

        match value {
            Some(v) => {
                self.values.insert(key, v.into());
            },
            None => {
                self.values.remove(&key);
            },
        }
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Result<Self> {
        self.set(key, Some(value))?;
        Ok(self)
    }

    /// Returns the record kind these attributes belong to.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the raw value for a key, blank or not.
    #[must_use]
    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Returns true if at least one value is non-blank after trimming.
    #[must_use]
    pub fn has_any_value(&self) -> bool {
        self.values.values().any(|v| !v.trim().is_empty())
    }

    /// Returns the provided (non-blank) values as sent to the lookup service.
    #[must_use]
    pub fn present(&self) -> BTreeMap<AttributeKey, String> {
        self.values
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }
}
