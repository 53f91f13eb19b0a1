//! Field rules: one coercion plus its constraints per field.
//!
//! Rules read raw JSON as a form submits it: numbers may arrive as strings,
//! optional fields may arrive as `""` or `null`.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::value::{FieldError, FieldValue};

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Coercion and constraints applied to one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldCheck {
    /// Text that must be present and non-blank.
    RequiredText,
    /// Text that may be absent; blank means not provided.
    OptionalText,
    /// Record identity (string or integer, at least 1) that must be present.
    RequiredId,
    /// Record identity that may be absent.
    OptionalId,
    /// Number (string or numeric) that may be absent, with an optional lower bound.
    Number {
        /// Inclusive lower bound.
        min: Option<f64>,
    },
    /// Number (string or numeric) that must be present and within `[min, max]`.
    Bounded {
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// Exactly one of a closed set of literals.
    OneOf(&'static [&'static str]),
    /// Date (`YYYY-MM-DD` or RFC 3339) that may be absent.
    OptionalDate,
    /// Email address that may be absent.
    OptionalEmail,
}

/// A row of a schema's rule table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    /// Field name in the payload.
    pub field: &'static str,
    /// Label used in error messages.
    pub label: &'static str,
    /// What the field must satisfy.
    pub check: FieldCheck,
}

impl FieldRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(field: &'static str, label: &'static str, check: FieldCheck) -> Self {
        Self {
            field,
            label,
            check,
        }
    }

    /// Coerces and checks this rule's raw value.
    ///
    /// `raw` is `None` when the payload has no such key.
    ///
    /// # Errors
    ///
    /// Returns the [`FieldError`] describing the violation.
    pub fn apply(&self, raw: Option<&Value>) -> Result<FieldValue, FieldError> {
        self.coerce(raw).map_err(|message| FieldError::new(self.field, message))
    }

    fn coerce(&self, raw: Option<&Value>) -> Result<FieldValue, String> {
        let label = self.label;
        match self.check {
            FieldCheck::RequiredText => match text(raw, label)? {
                FieldValue::NotProvided => Err(format!("{label} is required")),
                value => Ok(value),
            },
            FieldCheck::OptionalText => text(raw, label),
            FieldCheck::RequiredId => match id(raw, label)? {
                FieldValue::NotProvided => Err(format!("{label} is required")),
                value => Ok(value),
            },
            FieldCheck::OptionalId => id(raw, label),
            FieldCheck::Number { min } => {
                let value = number(raw, label)?;
                if let (FieldValue::Number(n), Some(min)) = (&value, min) {
                    if *n < min {
                        return Err(format!("{label} must be at least {min}"));
                    }
                }
                Ok(value)
            },
            FieldCheck::Bounded { min, max } => match number(raw, label)? {
                FieldValue::Number(n) if (min..=max).contains(&n) => Ok(FieldValue::Number(n)),
                FieldValue::Number(_) => Err(format!("{label} must be between {min} and {max}")),
                _ => Err(format!("{label} is required")),
            },
            FieldCheck::OneOf(allowed) => match raw {
                None | Some(Value::Null) => Err(format!("{label} is required")),
                Some(Value::String(s)) if allowed.contains(&s.as_str()) => {
                    Ok(FieldValue::Text(s.clone()))
                },
                Some(_) => Err(format!("{label} must be one of: {}", allowed.join(", "))),
            },
            FieldCheck::OptionalDate => date(raw, label),
            FieldCheck::OptionalEmail => match text(raw, label)? {
                FieldValue::Text(s) if !is_email(&s) => {
                    Err(format!("{label} must be a valid email address"))
                },
                value => Ok(value),
            },
        }
    }
}

fn text(raw: Option<&Value>, label: &str) -> Result<FieldValue, String> {
    match raw {
        None | Some(Value::Null) => Ok(FieldValue::NotProvided),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(FieldValue::NotProvided)
            } else {
                Ok(FieldValue::Text(trimmed.to_string()))
            }
        },
        Some(_) => Err(format!("{label} must be text")),
    }
}

fn number(raw: Option<&Value>, label: &str) -> Result<FieldValue, String> {
    let parsed = match raw {
        None | Some(Value::Null) => return Ok(FieldValue::NotProvided),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::NotProvided);
            }
            trimmed.parse::<f64>().ok()
        },
        Some(_) => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(FieldValue::Number(n)),
        _ => Err(format!("{label} must be a number")),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn id(raw: Option<&Value>, label: &str) -> Result<FieldValue, String> {
    let parsed = match raw {
        None | Some(Value::Null) => return Ok(FieldValue::NotProvided),
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::NotProvided);
            }
            trimmed.parse::<i64>().ok()
        },
        Some(_) => None,
    };

    match parsed {
        Some(n) if n >= 1 => Ok(FieldValue::Id(n)),
        _ => Err(format!("{label} must be a valid id")),
    }
}

fn date(raw: Option<&Value>, label: &str) -> Result<FieldValue, String> {
    match text(raw, label) {
        Ok(FieldValue::Text(s)) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.date_naive()))
            .map(FieldValue::Date)
            .ok_or_else(|| format!("{label} must be a valid date")),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("{label} must be a valid date")),
    }
}

fn is_email(s: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(s))
}
