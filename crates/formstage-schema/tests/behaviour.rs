//! End-to-end behaviour of the evaluation pipeline: visibility, rules,
//! stage validation, and payload building working together on schemas
//! loaded through the public loader.

use formstage_core::{ErrorKind, FieldValue, FormState, Schema, StageScope};
use formstage_schema::{
    build_submission_payload, prune_hidden, validate_stage, visible_fields, SchemaLoader,
};
use serde_json::json;

fn load(value: serde_json::Value) -> Schema {
    SchemaLoader::new().unwrap().load_value(&value).unwrap()
}

fn state(value: serde_json::Value) -> FormState {
    serde_json::from_value(value).unwrap()
}

fn visible_names(schema: &Schema, state: &FormState, scope: StageScope) -> Vec<String> {
    visible_fields(schema, state, scope)
        .into_iter()
        .map(|f| f.name.clone())
        .collect()
}

#[test]
fn test_required_text_rejects_empty_and_whitespace() {
    let schema = load(json!({"fields": [{"name": "name", "type": "text", "required": true}]}));
    for raw in ["", "   ", "\t\n"] {
        let mut st = state(json!({"name": raw}));
        let errors = validate_stage(&schema, &mut st, StageScope::Whole);
        assert_eq!(errors.kind("name"), Some(ErrorKind::Required), "value {raw:?}");
    }
}

#[test]
fn test_optional_empty_is_absent_everywhere() {
    let schema = load(json!({"fields": [
        {"name": "nick", "type": "text"},
        {"name": "age", "type": "number"},
        {"name": "mail", "type": "email"}
    ]}));
    let mut st = state(json!({"nick": " ", "age": "", "mail": ""}));
    assert!(validate_stage(&schema, &mut st, StageScope::Whole).is_empty());
    assert!(st.is_empty());
    assert!(build_submission_payload(&schema, &st).is_empty());
}

#[test]
fn test_number_bounds() {
    let schema = load(json!({"fields": [
        {"name": "n", "type": "number", "attributes": {"min": 1, "max": 10}}
    ]}));

    let mut st = state(json!({"n": "11"}));
    assert_eq!(validate_stage(&schema, &mut st, StageScope::Whole).kind("n"), Some(ErrorKind::Max));

    let mut st = state(json!({"n": "0"}));
    assert_eq!(validate_stage(&schema, &mut st, StageScope::Whole).kind("n"), Some(ErrorKind::Min));

    let mut st = state(json!({"n": "5"}));
    assert!(validate_stage(&schema, &mut st, StageScope::Whole).is_empty());
    assert_eq!(st.get("n"), Some(&FieldValue::Number(5.0)));
    assert_eq!(st.to_json().unwrap(), r#"{"n":5}"#);
}

#[test]
fn test_option_membership() {
    let schema = load(json!({"fields": [
        {"name": "s", "type": "select", "options": [{"value": "a"}, {"value": "b"}]}
    ]}));
    let mut st = state(json!({"s": "c"}));
    assert_eq!(
        validate_stage(&schema, &mut st, StageScope::Whole).kind("s"),
        Some(ErrorKind::OptionInvalid)
    );
    let mut st = state(json!({"s": "a"}));
    assert!(validate_stage(&schema, &mut st, StageScope::Whole).is_empty());
}

#[test]
fn test_checkbox_acceptance() {
    let schema = load(json!({"fields": [{"name": "ok", "type": "checkbox", "required": true}]}));
    for raw in [json!({"ok": false}), json!({})] {
        let mut st = state(raw);
        assert_eq!(
            validate_stage(&schema, &mut st, StageScope::Whole).kind("ok"),
            Some(ErrorKind::Acceptance)
        );
    }
    let mut st = state(json!({"ok": true}));
    assert!(validate_stage(&schema, &mut st, StageScope::Whole).is_empty());
    assert_eq!(st.get("ok"), Some(&FieldValue::Bool(true)));
}

#[test]
fn test_conditional_reveal() {
    let schema = load(json!({"fields": [
        {"name": "A", "type": "checkbox"},
        {"name": "B", "type": "text", "showIf": {"field": "A", "equals": true}}
    ]}));
    let mut st = state(json!({"A": false, "B": "x"}));
    prune_hidden(&schema, &mut st);
    assert!(!st.contains("B"));
    assert_eq!(visible_names(&schema, &st, StageScope::Whole), vec!["A"]);

    st.insert("A", true);
    prune_hidden(&schema, &mut st);
    assert_eq!(visible_names(&schema, &st, StageScope::Whole), vec!["A", "B"]);
    assert!(!st.contains("B"));
}

#[test]
fn test_end_to_end_name_and_age() {
    let schema = load(json!({"fields": [
        {"name": "name", "type": "text", "required": true},
        {"name": "age", "type": "number", "attributes": {"min": 0, "max": 120}}
    ]}));

    let mut st = state(json!({"name": "", "age": "200"}));
    let before = st.clone();
    let errors = validate_stage(&schema, &mut st, StageScope::Whole);
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({"name": "This field is required", "age": "Value must be at most 120"})
    );
    assert_eq!(st, before);

    let mut st = state(json!({"name": "Dana", "age": ""}));
    assert!(validate_stage(&schema, &mut st, StageScope::Whole).is_empty());
    assert_eq!(st.to_json().unwrap(), r#"{"name":"Dana"}"#);
    assert_eq!(
        build_submission_payload(&schema, &st).to_json().unwrap(),
        r#"{"name":"Dana"}"#
    );
}

#[test]
fn test_multi_stage_isolation() {
    let schema = load(json!({"stages": [
        {"id": "one", "label": "One", "fields": [{"name": "first", "type": "text", "required": true}]},
        {"id": "two", "label": "Two", "fields": [{"name": "mail", "type": "email", "required": true}]}
    ]}));
    let mut st = state(json!({"first": "ok", "mail": "not-an-email"}));
    assert!(validate_stage(&schema, &mut st, StageScope::Stage(0)).is_empty());

    let whole = validate_stage(&schema, &mut st, StageScope::Whole);
    assert_eq!(whole.len(), 1);
    assert_eq!(whole.kind("mail"), Some(ErrorKind::EmailInvalid));
}

#[test]
fn test_field_messages_override_catalog() {
    let schema = load(json!({"fields": [
        {"name": "income", "type": "number", "required": true,
         "errorMessages": {"required": "Enter an income", "min": "Must be positive"},
         "attributes": {"min": 0}}
    ]}));
    let mut st = FormState::new();
    assert_eq!(
        validate_stage(&schema, &mut st, StageScope::Whole).message("income"),
        Some("Enter an income")
    );
    st.insert("income", "-3");
    assert_eq!(
        validate_stage(&schema, &mut st, StageScope::Whole).message("income"),
        Some("Must be positive")
    );
}

#[test]
fn test_type_sensitive_gate_from_json_state() {
    let schema = load(json!({"fields": [
        {"name": "A", "type": "checkbox"},
        {"name": "B", "type": "text", "showIf": {"field": "A", "equals": true}}
    ]}));
    let st = state(json!({"A": "true"}));
    assert_eq!(visible_names(&schema, &st, StageScope::Whole), vec!["A"]);
}
