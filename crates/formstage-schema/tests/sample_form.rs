//! Checks against the shipped employment application form.

use std::path::PathBuf;

use formstage_core::{FieldValue, FormState, Schema, StageScope};
use formstage_schema::{
    build_submission_payload, lint_schema, validate_stage, visible_fields, SchemaLoader,
};

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop();
    dir.pop();
    dir
}

fn sample() -> Schema {
    SchemaLoader::new()
        .unwrap()
        .load_path(&repo_root().join("forms/employment-application.yaml"))
        .unwrap()
}

fn names(schema: &Schema, state: &FormState, scope: StageScope) -> Vec<String> {
    visible_fields(schema, state, scope)
        .into_iter()
        .map(|f| f.name.clone())
        .collect()
}

#[test]
fn test_sample_loads_cleanly() {
    let schema = sample();
    assert_eq!(schema.id(), Some("employment-application"));
    assert_eq!(schema.stage_count(), 5);
    assert!(schema.is_summary_stage(4));
    assert!(lint_schema(&schema).is_empty());
}

#[test]
fn test_organization_stage_branches_on_employment_type() {
    let schema = sample();
    let mut state = FormState::new();
    assert!(names(&schema, &state, StageScope::Stage(1)).is_empty());

    state.insert("employmentType", "employee");
    assert_eq!(names(&schema, &state, StageScope::Stage(1)), vec!["employerName"]);

    state.insert("employmentType", "self-employed");
    assert_eq!(
        names(&schema, &state, StageScope::Stage(1)),
        vec!["companyName", "businessDescription", "hasEmployees"]
    );
    state.insert("hasEmployees", true);
    assert!(names(&schema, &state, StageScope::Stage(1)).contains(&"teamSize".to_string()));
}

#[test]
fn test_plain_text_note_is_never_visible() {
    let schema = sample();
    let state = FormState::new();
    assert!(!names(&schema, &state, StageScope::Stage(0)).contains(&"employmentInfoNote".to_string()));
}

#[test]
fn test_financial_custom_messages() {
    let schema = sample();
    let mut state = FormState::new();
    state.insert("monthlyIncome", "abc");
    state.insert("paymentFrequency", "monthly");
    let errors = validate_stage(&schema, &mut state, StageScope::Stage(2));
    assert_eq!(errors.message("monthlyIncome"), Some("Digits only, please"));
    assert_eq!(errors.message("allowCreditCheck"), Some("You must consent to continue"));
}

#[test]
fn test_contact_phone_pattern() {
    let schema = sample();
    let mut state = FormState::new();
    state.insert("contactEmail", "dana@example.com");
    state.insert("contactPhone", "phone");
    let errors = validate_stage(&schema, &mut state, StageScope::Stage(3));
    assert_eq!(errors.message("contactPhone"), Some("Enter a valid phone number"));

    state.insert("contactPhone", "050-1234567");
    assert!(validate_stage(&schema, &mut state, StageScope::Stage(3)).is_empty());
}

#[test]
fn test_complete_application_payload() {
    let schema = sample();
    let mut state: FormState = [
        ("employmentType", FieldValue::text("self-employed")),
        ("workModel", FieldValue::text("freelance")),
        ("startDate", FieldValue::text("2024-03-01")),
        ("companyName", FieldValue::text(" Studio AB ")),
        ("hasEmployees", FieldValue::Bool(true)),
        ("teamSize", FieldValue::text("4")),
        ("monthlyIncome", FieldValue::text("12000")),
        ("paymentFrequency", FieldValue::text("monthly")),
        ("allowCreditCheck", FieldValue::Bool(true)),
        ("contactEmail", FieldValue::text("dana@example.com")),
        ("contactPhone", FieldValue::text("050-1234567")),
        ("employerName", FieldValue::text("stale")),
    ]
    .into_iter()
    .collect();

    assert!(validate_stage(&schema, &mut state, StageScope::Whole).is_empty());
    let payload = build_submission_payload(&schema, &state);
    assert!(!payload.contains("employerName"));
    assert_eq!(payload.get("companyName"), Some(&FieldValue::text("Studio AB")));
    assert_eq!(payload.get("teamSize"), Some(&FieldValue::Number(4.0)));
    assert_eq!(payload.get("hasEmployees"), Some(&FieldValue::Bool(true)));
    assert_eq!(payload.len(), 11);
}
