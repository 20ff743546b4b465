//! # Field Validator Factory
//!
//! Builds one [`FieldRule`] per field descriptor. A rule is an ordered list
//! of [`Check`]s evaluated with short-circuiting: the first failing check
//! decides the field's single error.
//!
//! | Field type | Snapshot | Checks, in order |
//! |---|---|---|
//! | checkbox | flag | acceptance (if required) |
//! | number | trimmed text | required, numeric, min, max |
//! | text family | trimmed text | required, email, pattern, option membership |
//!
//! Apart from `required`, every text check passes on an empty value, so an
//! optional field left empty is always valid.

use formstage_core::{parse_number, ErrorKind, Field, FieldType, FieldValue};
use regex::Regex;

// ─── Snapshot & Outcome ──────────────────────────────────────────────

/// The working copy of a raw value that a rule inspects.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Checkbox value coerced to a flag.
    Flag(bool),
    /// Any other value stringified and trimmed.
    Text(String),
}

impl Snapshot {
    fn as_text(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Flag(true) => "true",
            Self::Flag(false) => "false",
        }
    }

    fn as_flag(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

/// What a passing rule commits back into state.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Store this value.
    Value(FieldValue),
    /// Delete the key: the field is optional and was left empty.
    Absent,
}

/// A typed rule failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The violated bound as written in the schema, for `min`/`max`.
    pub bound: Option<String>,
}

impl RuleFailure {
    fn of(kind: ErrorKind) -> Self {
        Self { kind, bound: None }
    }
}

// ─── Checks ──────────────────────────────────────────────────────────

/// A numeric bound: parsed value plus its schema spelling for messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub text: String,
}

/// One step of a rule.
#[derive(Debug, Clone)]
pub enum Check {
    /// Value must be non-empty.
    Required,
    /// Non-empty value must look like `local@domain.tld`.
    Email,
    /// Non-empty value must match the tel pattern.
    Pattern(Regex),
    /// Non-empty value must be one of these option values.
    OneOf(Vec<String>),
    /// Non-empty value must parse as a finite number.
    Numeric,
    /// Non-empty value must be at least this.
    Min(Bound),
    /// Non-empty value must be at most this.
    Max(Bound),
    /// Flag must be set.
    Acceptance,
}

impl Check {
    fn run(&self, snapshot: &Snapshot) -> Result<(), RuleFailure> {
        let text = snapshot.as_text();
        let empty = text.is_empty();
        let ok = match self {
            Self::Required => !empty,
            Self::Acceptance => snapshot.as_flag(),
            _ if empty => true,
            Self::Email => is_email(text),
            Self::Pattern(re) => re.is_match(text),
            Self::OneOf(allowed) => allowed.iter().any(|a| a == text),
            Self::Numeric => parse_number(text).is_some(),
            Self::Min(b) => parse_number(text).is_some_and(|n| n >= b.value),
            Self::Max(b) => parse_number(text).is_some_and(|n| n <= b.value),
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            Self::Required => RuleFailure::of(ErrorKind::Required),
            Self::Email => RuleFailure::of(ErrorKind::EmailInvalid),
            Self::Pattern(_) => RuleFailure::of(ErrorKind::PhoneInvalid),
            Self::OneOf(_) => RuleFailure::of(ErrorKind::OptionInvalid),
            Self::Numeric => RuleFailure::of(ErrorKind::NumberInvalid),
            Self::Acceptance => RuleFailure::of(ErrorKind::Acceptance),
            Self::Min(b) => RuleFailure {
                kind: ErrorKind::Min,
                bound: Some(b.text.clone()),
            },
            Self::Max(b) => RuleFailure {
                kind: ErrorKind::Max,
                bound: Some(b.text.clone()),
            },
        })
    }
}

/// Equivalent of `^[^\s@]+@[^\s@]+\.[^\s@]+$`: no whitespace, exactly one
/// `@` with a non-empty local part, and a domain holding a dot that is
/// neither its first nor its last character.
pub fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// ─── Rule ────────────────────────────────────────────────────────────

/// How a rule snapshots its raw value and normalizes a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Checkbox,
    Number,
    Text,
}

/// The validation rule for one field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    kind: RuleKind,
    required: bool,
    checks: Vec<Check>,
}

impl FieldRule {
    /// Which snapshot/normalization family the rule belongs to.
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Checks in evaluation order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Build the working snapshot of a raw state value.
    ///
    /// Checkboxes coerce by truthiness (absent is `false`); everything else
    /// is stringified and trimmed (absent is `""`).
    pub fn snapshot(&self, raw: Option<&FieldValue>) -> Snapshot {
        match self.kind {
            RuleKind::Checkbox => Snapshot::Flag(raw.is_some_and(FieldValue::is_truthy)),
            RuleKind::Number | RuleKind::Text => Snapshot::Text(
                raw.map(|v| v.to_text().trim().to_string())
                    .unwrap_or_default(),
            ),
        }
    }

    /// Run the checks against a snapshot.
    pub fn apply(&self, snapshot: &Snapshot) -> Result<Normalized, RuleFailure> {
        for check in &self.checks {
            check.run(snapshot)?;
        }
        Ok(self.normalize(snapshot))
    }

    fn normalize(&self, snapshot: &Snapshot) -> Normalized {
        match self.kind {
            RuleKind::Checkbox => Normalized::Value(FieldValue::Bool(snapshot.as_flag())),
            RuleKind::Number => match parse_number(snapshot.as_text()) {
                Some(n) => Normalized::Value(FieldValue::Number(n)),
                None => Normalized::Absent,
            },
            RuleKind::Text => {
                let text = snapshot.as_text();
                if text.is_empty() && !self.required {
                    Normalized::Absent
                } else {
                    Normalized::Value(FieldValue::text(text))
                }
            }
        }
    }
}

/// Build the rule for a field, dispatching on its type.
///
/// A tel pattern that does not compile is skipped with a warning; schema
/// lint reports it as an error before a schema is accepted by the loader.
pub fn build_rule(field: &Field) -> FieldRule {
    match field.field_type {
        FieldType::Checkbox => build_checkbox_rule(field),
        FieldType::Number => build_number_rule(field),
        _ => build_text_rule(field),
    }
}

fn build_checkbox_rule(field: &Field) -> FieldRule {
    let mut checks = Vec::new();
    if field.required {
        checks.push(Check::Acceptance);
    }
    FieldRule {
        kind: RuleKind::Checkbox,
        required: field.required,
        checks,
    }
}

fn build_number_rule(field: &Field) -> FieldRule {
    let mut checks = Vec::new();
    if field.required {
        checks.push(Check::Required);
    }
    checks.push(Check::Numeric);
    if let Some(bound) = field.attributes.min().and_then(bound_of) {
        checks.push(Check::Min(bound));
    }
    if let Some(bound) = field.attributes.max().and_then(bound_of) {
        checks.push(Check::Max(bound));
    }
    FieldRule {
        kind: RuleKind::Number,
        required: field.required,
        checks,
    }
}

fn build_text_rule(field: &Field) -> FieldRule {
    let mut checks = Vec::new();
    if field.required {
        checks.push(Check::Required);
    }
    if field.field_type == FieldType::Email {
        checks.push(Check::Email);
    }
    if field.field_type == FieldType::Tel {
        if let Some(pattern) = field.attributes.pattern() {
            match Regex::new(pattern) {
                Ok(re) => checks.push(Check::Pattern(re)),
                Err(e) => tracing::warn!(
                    field = %field.name,
                    pattern,
                    error = %e,
                    "skipping uncompilable tel pattern"
                ),
            }
        }
    }
    if field.field_type.is_choice() {
        if let Some(options) = &field.options {
            checks.push(Check::OneOf(options.iter().map(|o| o.value_text()).collect()));
        }
    }
    FieldRule {
        kind: RuleKind::Text,
        required: field.required,
        checks,
    }
}

fn bound_of(value: &FieldValue) -> Option<Bound> {
    value.as_number().map(|n| Bound {
        value: n,
        text: value.to_text(),
    })
}
