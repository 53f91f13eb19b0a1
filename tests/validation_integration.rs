//! Schema validation integration tests.
//!
//! Exercises the built-in record schemas through the public API:
//! - Required, optional, numeric, bounded, enumerated and date rules
//! - Error collection across fields
//! - The stage and probability contract shared with the server

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use crmcheck::services::validation::{DEAL_STAGES, FieldCheck, FieldRule};
use crmcheck::{FieldError, FieldValue, Schema};
use serde_json::{Value, json};
use test_case::test_case;

fn deal(overrides: Value) -> Value {
    let mut base = json!({
        "title": "Annual renewal",
        "company_id": "1",
        "stage": "New Lead",
        "probability": 50
    });
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in overrides {
            base.insert(k.clone(), v.clone());
        }
    }
    base
}

// ============================================================================
// Deal schema
// ============================================================================

#[test]
fn test_empty_title_is_the_only_error() {
    let errors = Schema::deal()
        .validate(&json!({
            "title": "",
            "company_id": "1",
            "stage": "New Lead",
            "probability": 50
        }))
        .unwrap_err();

    assert_eq!(errors, vec![FieldError::new("title", "Title is required")]);
}

#[test]
fn test_empty_value_is_not_provided() {
    let record = Schema::deal().validate(&deal(json!({ "value": "" }))).unwrap();
    assert_eq!(record.get("value"), Some(&FieldValue::NotProvided));
    assert_ne!(record.get("value"), Some(&FieldValue::Number(0.0)));

    let field = Schema::deal().validate_field("value", Some(&json!("")));
    assert_eq!(field, Some(Ok(FieldValue::NotProvided)));
}

#[test]
fn test_probability_out_of_range_fails() {
    let errors = Schema::deal()
        .validate(&deal(json!({ "probability": 150 })))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "probability");
    assert_eq!(errors[0].message, "Probability must be between 0 and 100");
}

#[test]
fn test_probability_upper_bound_is_inclusive() {
    let record = Schema::deal()
        .validate(&deal(json!({ "probability": 100 })))
        .unwrap();
    assert_eq!(record.number("probability"), Some(100.0));
}

#[test_case(json!("abc") ; "non numeric string")]
#[test_case(json!([1]) ; "array")]
fn test_probability_must_be_numeric(raw: Value) {
    let errors = Schema::deal()
        .validate(&deal(json!({ "probability": raw })))
        .unwrap_err();
    assert_eq!(errors[0].message, "Probability must be a number");
}

#[test]
fn test_every_stage_is_accepted() {
    for stage in DEAL_STAGES {
        let record = Schema::deal()
            .validate(&deal(json!({ "stage": stage })))
            .unwrap();
        assert_eq!(record.text("stage"), Some(*stage));
    }
}

#[test_case("new lead" ; "wrong case")]
#[test_case("Won" ; "unknown stage")]
#[test_case("" ; "empty")]
fn test_unknown_stage_fails(stage: &str) {
    let errors = Schema::deal()
        .validate(&deal(json!({ "stage": stage })))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "stage");
    assert!(errors[0].message.starts_with("Stage must be one of: New Lead"));
}

#[test]
fn test_negative_value_fails_lower_bound() {
    let errors = Schema::deal()
        .validate(&deal(json!({ "value": "-10" })))
        .unwrap_err();
    assert_eq!(
        errors,
        vec![FieldError::new("value", "Value must be at least 0")]
    );
}

#[test]
fn test_optional_close_date() {
    let record = Schema::deal().validate(&deal(json!({}))).unwrap();
    assert!(!record.is_provided("expected_close_date"));

    let record = Schema::deal()
        .validate(&deal(json!({ "expected_close_date": "2026-12-01" })))
        .unwrap();
    assert_eq!(
        record.date("expected_close_date").map(|d| d.to_string()),
        Some("2026-12-01".to_string())
    );

    let errors = Schema::deal()
        .validate(&deal(json!({ "expected_close_date": "31/12/2026" })))
        .unwrap_err();
    assert_eq!(errors[0].message, "Expected close date must be a valid date");
}

#[test]
fn test_empty_payload_reports_all_required_fields() {
    let errors = Schema::deal().validate(&json!({})).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "company_id", "stage", "probability"]);
}

// ============================================================================
// Company and contact schemas
// ============================================================================

#[test]
fn test_company_minimal() {
    let record = Schema::company().validate(&json!({ "name": "Acme" })).unwrap();
    assert_eq!(record.text("name"), Some("Acme"));
    assert!(!record.is_provided("email"));
    assert!(!record.is_provided("employees"));
}

#[test]
fn test_company_collects_errors() {
    let errors = Schema::company()
        .validate(&json!({ "name": "", "email": "not-an-email", "employees": "many" }))
        .unwrap_err();
    assert_eq!(
        errors,
        vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("email", "Email must be a valid email address"),
            FieldError::new("employees", "Employees must be a number"),
        ]
    );
}

#[test]
fn test_contact_optional_company() {
    let record = Schema::contact()
        .validate(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "company_id": 12
        }))
        .unwrap();
    assert_eq!(record.id("company_id"), Some(12));
    assert_eq!(record.text("email"), Some("ada@example.com"));
}

// ============================================================================
// Extension
// ============================================================================

#[test]
fn test_custom_schema_from_table() {
    const TASK_RULES: &[FieldRule] = &[
        FieldRule::new("subject", "Subject", FieldCheck::RequiredText),
        FieldRule::new("due", "Due date", FieldCheck::OptionalDate),
        FieldRule::new(
            "priority",
            "Priority",
            FieldCheck::Bounded { min: 1.0, max: 5.0 },
        ),
    ];
    let schema = Schema::new("task", TASK_RULES);

    let record = schema
        .validate(&json!({ "subject": "Call back", "priority": "3" }))
        .unwrap();
    assert_eq!(record.schema, "task");
    assert_eq!(record.number("priority"), Some(3.0));

    let errors = schema
        .validate(&json!({ "subject": "Call back", "priority": 9 }))
        .unwrap_err();
    assert_eq!(errors[0].message, "Priority must be between 1 and 5");
}
