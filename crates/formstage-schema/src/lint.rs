//! # Schema Lint
//!
//! Authoring checks that go beyond structural integrity. A schema can be
//! well-formed (every `showIf` names a real field, names are unique) and
//! still be unusable at runtime: a gate cycle hides its fields forever, a
//! tel pattern that does not compile is silently skipped, a bound that is
//! not a number never applies.
//!
//! Findings carry a severity. [`SchemaLoader`](crate::SchemaLoader)
//! rejects schemas with any [`LintSeverity::Error`] finding; warnings are
//! reported by `formstage lint` only.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use formstage_core::{ErrorKind, Field, FieldType, Schema};
use regex::Regex;
use serde::Serialize;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    /// The schema cannot behave as written; loading fails.
    Error,
    /// Suspicious but usable.
    Warning,
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// A single authoring finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub severity: LintSeverity,
    /// Field the finding is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Stage the finding is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<usize>,
    pub message: String,
}

impl LintFinding {
    fn error(field: Option<&str>, stage: Option<usize>, message: String) -> Self {
        Self {
            severity: LintSeverity::Error,
            field: field.map(str::to_string),
            stage,
            message,
        }
    }

    fn warning(field: Option<&str>, stage: Option<usize>, message: String) -> Self {
        Self {
            severity: LintSeverity::Warning,
            field: field.map(str::to_string),
            stage,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == LintSeverity::Error
    }
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        match (&self.field, self.stage) {
            (Some(field), Some(stage)) => write!(f, " [stage {stage}, {field}]")?,
            (Some(field), None) => write!(f, " [{field}]")?,
            (None, Some(stage)) => write!(f, " [stage {stage}]")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Run every check over `schema`. Findings are ordered by severity, then
/// by the order the checks encounter them.
pub fn lint_schema(schema: &Schema) -> Vec<LintFinding> {
    let mut findings = Vec::new();
    audit_show_if_cycles(schema, &mut findings);
    for field in schema.fields() {
        audit_field(schema, field, &mut findings);
    }
    for (index, stage) in schema.stages().iter().enumerate() {
        if stage.is_summary() && !stage.fields.is_empty() {
            findings.push(LintFinding::warning(
                None,
                Some(index),
                format!(
                    "summary stage '{}' carries {} field(s); summary stages only recap",
                    stage.id,
                    stage.fields.len()
                ),
            ));
        }
    }
    findings.sort_by_key(|f| f.severity);
    findings
}

/// Whether any finding is an error.
pub fn has_errors(findings: &[LintFinding]) -> bool {
    findings.iter().any(LintFinding::is_error)
}

fn audit_field(schema: &Schema, field: &Field, findings: &mut Vec<LintFinding>) {
    let name = Some(field.name.as_str());
    let stage = schema.stage_of(&field.name);

    if let Some(cond) = &field.show_if {
        let gate_is_plain = schema.field(&cond.field).is_some_and(Field::is_plain_text);
        if gate_is_plain {
            findings.push(LintFinding::error(
                name,
                stage,
                format!("showIf is gated on plain-text field '{}', which never holds a value", cond.field),
            ));
        }
    }

    match field.field_type {
        FieldType::Tel => {
            if let Some(pattern) = field.attributes.pattern() {
                if let Err(e) = Regex::new(pattern) {
                    findings.push(LintFinding::error(
                        name,
                        stage,
                        format!("pattern '{pattern}' does not compile: {e}"),
                    ));
                }
            }
        }
        FieldType::Number => {
            for (key, bound) in [("min", field.attributes.min()), ("max", field.attributes.max())] {
                if let Some(value) = bound {
                    if value.as_number().is_none() {
                        findings.push(LintFinding::error(
                            name,
                            stage,
                            format!("{key} bound '{value}' is not a number"),
                        ));
                    }
                }
            }
        }
        _ => {}
    }

    let has_options = field.options.as_ref().is_some_and(|o| !o.is_empty());
    if field.field_type.is_choice() && !has_options {
        findings.push(LintFinding::warning(
            name,
            stage,
            format!("{} field has no options; any value will be accepted", field.field_type),
        ));
    }
    if !field.field_type.is_choice() && field.options.is_some() {
        findings.push(LintFinding::warning(
            name,
            stage,
            format!("options are ignored on a {} field", field.field_type),
        ));
    }

    for key in field.error_messages.keys() {
        if ErrorKind::from_key(key).is_none() {
            findings.push(LintFinding::warning(
                name,
                stage,
                format!("errorMessages key '{key}' matches no rule"),
            ));
        }
    }
}

/// Every field has at most one gate, so each walk follows a single chain.
/// A chain that revisits one of its own nodes has entered a cycle; each
/// distinct cycle is reported once, on its first member in form order.
fn audit_show_if_cycles(schema: &Schema, findings: &mut Vec<LintFinding>) {
    let mut reported: HashSet<BTreeSet<&str>> = HashSet::new();

    for start in schema.fields() {
        let mut path: Vec<&str> = Vec::new();
        let mut current = Some(start);
        while let Some(field) = current {
            if let Some(pos) = path.iter().position(|n| *n == field.name) {
                let members: BTreeSet<&str> = path[pos..].iter().copied().collect();
                if reported.insert(members) {
                    let anchor = schema
                        .fields()
                        .iter()
                        .find(|f| path[pos..].contains(&f.name.as_str()))
                        .map_or(field.name.as_str(), |f| f.name.as_str());
                    let mut chain: Vec<&str> = path[pos..].to_vec();
                    chain.push(field.name.as_str());
                    findings.push(LintFinding::error(
                        Some(anchor),
                        schema.stage_of(anchor),
                        format!("showIf cycle: {}; these fields can never be shown", chain.join(" -> ")),
                    ));
                }
                break;
            }
            path.push(field.name.as_str());
            current = field
                .show_if
                .as_ref()
                .and_then(|cond| schema.field(&cond.field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstage_core::{FieldOption, FieldValue, Stage};

    fn single(fields: Vec<Field>) -> Schema {
        Schema::single_stage(None, fields).unwrap()
    }

    fn errors(findings: &[LintFinding]) -> Vec<&LintFinding> {
        findings.iter().filter(|f| f.is_error()).collect()
    }

    #[test]
    fn test_clean_schema_has_no_findings() {
        let schema = single(vec![
            Field::new("kind", FieldType::Radio).options(vec![
                FieldOption::Plain(FieldValue::text("a")),
                FieldOption::Plain(FieldValue::text("b")),
            ]),
            Field::new("detail", FieldType::Text).show_if("kind", "a"),
            Field::new("phone", FieldType::Tel).attribute("pattern", "^0\\d{8,9}$"),
            Field::new("age", FieldType::Number).attribute("min", 0_i64),
        ]);
        assert!(lint_schema(&schema).is_empty());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let schema = single(vec![Field::new("a", FieldType::Text).show_if("a", "x")]);
        let findings = lint_schema(&schema);
        assert_eq!(errors(&findings).len(), 1);
        assert!(findings[0].message.contains("a -> a"));
    }

    #[test]
    fn test_cycle_reported_once() {
        let schema = single(vec![
            Field::new("a", FieldType::Text).show_if("c", "x"),
            Field::new("b", FieldType::Text).show_if("a", "x"),
            Field::new("c", FieldType::Text).show_if("b", "x"),
            Field::new("d", FieldType::Text).show_if("a", "x"),
        ]);
        let findings = lint_schema(&schema);
        let errs = errors(&findings);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field.as_deref(), Some("a"));
    }

    #[test]
    fn test_bad_tel_pattern_is_an_error() {
        let schema = single(vec![Field::new("phone", FieldType::Tel).attribute("pattern", "([0-9")]);
        assert!(has_errors(&lint_schema(&schema)));
    }

    #[test]
    fn test_non_numeric_bound_is_an_error() {
        let schema = single(vec![Field::new("age", FieldType::Number).attribute("max", "lots")]);
        let findings = lint_schema(&schema);
        assert!(has_errors(&findings));
        assert!(findings[0].message.contains("max"));
    }

    #[test]
    fn test_gate_on_plain_text_is_an_error() {
        let schema = single(vec![
            Field::new("note", FieldType::PlainText),
            Field::new("x", FieldType::Text).show_if("note", "hi"),
        ]);
        assert!(has_errors(&lint_schema(&schema)));
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let schema = Schema::multi_stage(
            Some("w".into()),
            vec![
                Stage::new(
                    "one",
                    "One",
                    vec![
                        Field::new("pick", FieldType::Select),
                        Field::new("name", FieldType::Text)
                            .options(vec![FieldOption::Plain(FieldValue::text("x"))])
                            .message(ErrorKind::Required, "Name please"),
                        Field::new("age", FieldType::Number).message_key("tooOld", "Too old"),
                    ],
                ),
                Stage {
                    fields: vec![Field::new("recap", FieldType::PlainText)],
                    ..Stage::summary("summary", "Summary")
                },
            ],
        )
        .unwrap();
        let findings = lint_schema(&schema);
        assert_eq!(findings.len(), 4);
        assert!(!has_errors(&findings));
        assert!(findings.iter().any(|f| f.stage == Some(1) && f.field.is_none()));
    }

    #[test]
    fn test_display_names_location() {
        let finding = LintFinding::error(Some("age"), Some(2), "bad".into());
        assert_eq!(finding.to_string(), "error [stage 2, age]: bad");
    }

    trait MessageKey {
        fn message_key(self, key: &str, message: &str) -> Self;
    }

    impl MessageKey for Field {
        fn message_key(mut self, key: &str, message: &str) -> Self {
            self.error_messages.insert(key.into(), message.into());
            self
        }
    }
}
