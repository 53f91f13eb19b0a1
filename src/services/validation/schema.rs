//! Record schemas as rule tables.
//!
//! The built-in tables mirror the server's validation rules for the same
//! record types and must be kept in sync with them by hand. In particular
//! [`DEAL_STAGES`] and the probability bounds are a versioned contract.

use serde_json::Value;
use std::collections::BTreeMap;

use super::rules::{FieldCheck, FieldRule};
use super::value::{FieldError, ValidatedRecord};

/// Workflow stages a deal may be in.
pub const DEAL_STAGES: &[&str] = &[
    "New Lead",
    "Qualified",
    "Proposal",
    "Negotiation",
    "Closed Won",
    "Closed Lost",
];

/// Inclusive bounds of a deal's win probability, in percent.
pub const PROBABILITY_RANGE: (f64, f64) = (0.0, 100.0);

const DEAL_RULES: &[FieldRule] = &[
    FieldRule::new("title", "Title", FieldCheck::RequiredText),
    FieldRule::new("company_id", "Company", FieldCheck::RequiredId),
    FieldRule::new("contact_id", "Contact", FieldCheck::OptionalId),
    FieldRule::new("value", "Value", FieldCheck::Number { min: Some(0.0) }),
    FieldRule::new("stage", "Stage", FieldCheck::OneOf(DEAL_STAGES)),
    FieldRule::new(
        "probability",
        "Probability",
        FieldCheck::Bounded {
            min: PROBABILITY_RANGE.0,
            max: PROBABILITY_RANGE.1,
        },
    ),
    FieldRule::new(
        "expected_close_date",
        "Expected close date",
        FieldCheck::OptionalDate,
    ),
    FieldRule::new("notes", "Notes", FieldCheck::OptionalText),
];

const COMPANY_RULES: &[FieldRule] = &[
    FieldRule::new("name", "Name", FieldCheck::RequiredText),
    FieldRule::new("email", "Email", FieldCheck::OptionalEmail),
    FieldRule::new("website", "Website", FieldCheck::OptionalText),
    FieldRule::new("phone", "Phone", FieldCheck::OptionalText),
    FieldRule::new("industry", "Industry", FieldCheck::OptionalText),
    FieldRule::new("address", "Address", FieldCheck::OptionalText),
    FieldRule::new("employees", "Employees", FieldCheck::Number { min: Some(0.0) }),
];

const CONTACT_RULES: &[FieldRule] = &[
    FieldRule::new("first_name", "First name", FieldCheck::RequiredText),
    FieldRule::new("last_name", "Last name", FieldCheck::RequiredText),
    FieldRule::new("email", "Email", FieldCheck::OptionalEmail),
    FieldRule::new("phone", "Phone", FieldCheck::OptionalText),
    FieldRule::new("position", "Position", FieldCheck::OptionalText),
    FieldRule::new("company_id", "Company", FieldCheck::OptionalId),
];

/// A named table of field rules.
///
/// Validation is pure and evaluates every rule independently, so a rejected
/// payload reports all of its problems at once.
///
/// # Example
///
/// ```rust
/// use crmcheck::Schema;
/// use serde_json::json;
///
/// let errors = Schema::deal()
///     .validate(&json!({ "title": "", "company_id": "1", "stage": "New Lead", "probability": 50 }))
///     .unwrap_err();
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].field, "title");
/// assert_eq!(errors[0].message, "Title is required");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: &'static str,
    rules: Vec<FieldRule>,
}

impl Schema {
    /// Creates a schema from a rule table.
    #[must_use]
    pub fn new(name: &'static str, rules: &[FieldRule]) -> Self {
        Self {
            name,
            rules: rules.to_vec(),
        }
    }

    /// Schema for deals.
    #[must_use]
    pub fn deal() -> Self {
        Self::new("deal", DEAL_RULES)
    }

    /// Schema for companies.
    #[must_use]
    pub fn company() -> Self {
        Self::new("company", COMPANY_RULES)
    }

    /// Schema for contacts.
    #[must_use]
    pub fn contact() -> Self {
        Self::new("contact", CONTACT_RULES)
    }

    /// Looks up a built-in schema by record name (singular or plural).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "deal" | "deals" => Some(Self::deal()),
            "company" | "companies" => Some(Self::company()),
            "contact" | "contacts" => Some(Self::contact()),
            _ => None,
        }
    }

    /// Adds a rule, replacing any existing rule for the same field.
    #[must_use]
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        match self.rules.iter_mut().find(|r| r.field == rule.field) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    /// Returns the schema's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the rule table in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Validates a raw payload.
    ///
    /// A payload that is not a JSON object is treated as having no fields.
    /// Keys without a rule are ignored.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldError`], in rule order, if any rule fails.
    pub fn validate(&self, raw: &Value) -> Result<ValidatedRecord, Vec<FieldError>> {
        let object = raw.as_object();
        let mut fields = BTreeMap::new();
        let mut errors = Vec::new();

        for rule in &self.rules {
            match rule.apply(object.and_then(|o| o.get(rule.field))) {
                Ok(value) => {
                    fields.insert(rule.field, value);
                },
                Err(error) => errors.push(error),
            }
        }

        if errors.is_empty() {
            Ok(ValidatedRecord {
                schema: self.name,
                fields,
            })
        } else {
            Err(errors)
        }
    }

    /// Validates a single field in isolation, as a form does on blur.
    ///
    /// Returns `None` if the schema has no rule for `field`.
    #[must_use]
    pub fn validate_field(
        &self,
        field: &str,
        raw: Option<&Value>,
    ) -> Option<Result<super::value::FieldValue, FieldError>> {
        self.rules
            .iter()
            .find(|r| r.field == field)
            .map(|rule| rule.apply(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::FieldValue;
    use serde_json::json;

    #[test]
    fn test_deal_valid_payload() {
        let record = Schema::deal()
            .validate(&json!({
                "title": "Annual renewal",
                "company_id": 3,
                "contact_id": "",
                "value": "12500.50",
                "stage": "Negotiation",
                "probability": "75",
                "expected_close_date": "2026-11-30",
                "notes": null
            }))
            .unwrap();

        assert_eq!(record.schema, "deal");
        assert_eq!(record.text("title"), Some("Annual renewal"));
        assert_eq!(record.id("company_id"), Some(3));
        assert!(!record.is_provided("contact_id"));
        assert_eq!(record.number("value"), Some(12500.5));
        assert_eq!(record.number("probability"), Some(75.0));
        assert!(record.date("expected_close_date").is_some());
        assert_eq!(record.get("notes"), Some(&FieldValue::NotProvided));
        assert_eq!(record.fields.len(), DEAL_RULES.len());
    }

    /// Counts every metric a closure registers.
    #[derive(Default)]
    struct CountingRecorder {
        registered: std::sync::atomic::AtomicUsize,
    }

    impl CountingRecorder {
        fn bump(&self) {
            self.registered
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl metrics::Recorder for CountingRecorder {
        fn describe_counter(
            &self,
            _: metrics::KeyName,
            _: Option<metrics::Unit>,
            _: metrics::SharedString,
        ) {
        }
        fn describe_gauge(
            &self,
            _: metrics::KeyName,
            _: Option<metrics::Unit>,
            _: metrics::SharedString,
        ) {
        }
        fn describe_histogram(
            &self,
            _: metrics::KeyName,
            _: Option<metrics::Unit>,
            _: metrics::SharedString,
        ) {
        }

        fn register_counter(
            &self,
            _: &metrics::Key,
            _: &metrics::Metadata<'_>,
        ) -> metrics::Counter {
            self.bump();
            metrics::Counter::noop()
        }

        fn register_gauge(&self, _: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Gauge {
            self.bump();
            metrics::Gauge::noop()
        }

        fn register_histogram(
            &self,
            _: &metrics::Key,
            _: &metrics::Metadata<'_>,
        ) -> metrics::Histogram {
            self.bump();
            metrics::Histogram::noop()
        }
    }

    #[test]
    fn test_rejection_touches_no_shared_state() {
        let recorder = CountingRecorder::default();
        let errors = metrics::with_local_recorder(&recorder, || {
            Schema::deal().validate(&json!({ "probability": 150 }))
        })
        .unwrap_err();

        assert!(!errors.is_empty());
        assert_eq!(
            recorder
                .registered
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[test]
    fn test_deal_collects_every_error() {
        let errors = Schema::deal()
            .validate(&json!({
                "title": " ",
                "company_id": "abc",
                "value": -1,
                "stage": "Won",
                "probability": 150,
                "expected_close_date": "soon"
            }))
            .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "title",
                "company_id",
                "value",
                "stage",
                "probability",
                "expected_close_date"
            ]
        );
    }

    #[test]
    fn test_non_object_payload_reports_required_fields() {
        let errors = Schema::contact().validate(&json!("Ada")).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["first_name", "last_name"]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let record = Schema::company()
            .validate(&json!({ "name": "Acme", "favourite_colour": "teal" }))
            .unwrap();
        assert!(record.get("favourite_colour").is_none());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Schema::by_name("Deals").map(|s| s.name()), Some("deal"));
        assert_eq!(Schema::by_name("company").map(|s| s.name()), Some("company"));
        assert!(Schema::by_name("invoice").is_none());
    }

    #[test]
    fn test_with_rule_extends_and_replaces() {
        let schema = Schema::contact()
            .with_rule(FieldRule::new("linkedin", "LinkedIn", FieldCheck::OptionalText))
            .with_rule(FieldRule::new("phone", "Phone", FieldCheck::RequiredText));

        assert_eq!(schema.rules().len(), CONTACT_RULES.len() + 1);
        let errors = schema
            .validate(&json!({ "first_name": "Ada", "last_name": "Lovelace" }))
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("phone", "Phone is required")]);
    }

    #[test]
    fn test_validate_field() {
        let schema = Schema::deal();
        assert_eq!(
            schema.validate_field("value", Some(&json!(""))),
            Some(Ok(FieldValue::NotProvided))
        );
        assert!(schema.validate_field("unknown", None).is_none());
    }
}
