//! # Schema Loading
//!
//! Turns a schema document (JSON or YAML) into a [`Schema`] in four steps:
//!
//! 1. Parse the text. YAML is converted to the equivalent JSON value tree.
//! 2. Check the value against the embedded structural schema
//!    (`schemas/form.schema.json`, Draft 2020-12).
//! 3. Decode into a [`SchemaDefinition`] and build the indexed [`Schema`],
//!    enforcing name uniqueness, `showIf` targets, and stage flattening.
//! 4. Lint. Any error-severity finding rejects the schema.
//!
//! Structural violations are reported together with their instance paths
//! so an author can fix every problem in one pass.

use std::fmt;
use std::path::Path;

use formstage_core::{Schema, SchemaDefinition, SchemaError};
use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::lint::{has_errors, lint_schema, LintFinding};

/// Structural schema for form documents.
const FORM_SCHEMA: &str = include_str!("../schemas/form.schema.json");

/// Error while loading a form schema.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The document could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path (or `<inline>`) of the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The document does not have the shape of a form schema.
    #[error("schema structure is invalid:\n{violations}")]
    Structure {
        /// Every structural violation found.
        violations: ValidationViolations,
    },

    /// The document has the right shape but could not be decoded.
    #[error("schema decode error: {reason}")]
    Decode {
        /// Decoder message.
        reason: String,
    },

    /// The decoded schema breaks a structural invariant.
    #[error("schema integrity error: {0}")]
    Integrity(#[from] SchemaError),

    /// Lint found error-severity problems.
    #[error("schema has {} lint error(s):\n{}", .findings.iter().filter(|f| f.is_error()).count(), render_findings(.findings))]
    Lint {
        /// All findings, including warnings.
        findings: Vec<LintFinding>,
    },

    /// The embedded structural schema failed to compile.
    #[error("validator build error: {reason}")]
    ValidatorBuild {
        /// Reason the validator could not be built.
        reason: String,
    },
}

fn render_findings(findings: &[LintFinding]) -> String {
    findings
        .iter()
        .filter(|f| f.is_error())
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single structural violation.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer to the violating value in the document.
    pub instance_path: String,
    /// JSON Pointer to the rule in the structural schema.
    pub schema_path: String,
    /// Description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Structural violations of one document.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Text format of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format implied by a file extension. Anything other than
    /// `.yaml`/`.yml` is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Loads and checks form schemas.
///
/// The structural validator is compiled once; a loader can be reused for
/// any number of documents and shared across threads.
pub struct SchemaLoader {
    validator: Validator,
}

impl fmt::Debug for SchemaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLoader").finish_non_exhaustive()
    }
}

impl SchemaLoader {
    /// Compile the embedded structural schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLoadError::ValidatorBuild`] if the embedded schema is
    /// not valid JSON or not a valid Draft 2020-12 schema.
    pub fn new() -> Result<Self, SchemaLoadError> {
        let schema: Value = serde_json::from_str(FORM_SCHEMA).map_err(|e| SchemaLoadError::ValidatorBuild {
            reason: format!("embedded schema is not JSON: {e}"),
        })?;
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| SchemaLoadError::ValidatorBuild { reason: e.to_string() })?;
        Ok(Self { validator })
    }

    /// Load a schema file, choosing JSON or YAML by extension.
    pub fn load_path(&self, path: &Path) -> Result<Schema, SchemaLoadError> {
        let value = read_document(path)?;
        let schema = self.load_value(&value)?;
        tracing::info!(
            path = %path.display(),
            id = schema.id().unwrap_or("-"),
            stages = schema.stage_count(),
            fields = schema.fields().len(),
            "loaded form schema"
        );
        Ok(schema)
    }

    /// Load a schema from text.
    pub fn load_str(&self, content: &str, format: DocumentFormat) -> Result<Schema, SchemaLoadError> {
        let value = parse_document(content, format, "<inline>")?;
        self.load_value(&value)
    }

    /// Check, decode, build, and lint a parsed document.
    pub fn load_value(&self, value: &Value) -> Result<Schema, SchemaLoadError> {
        let schema = self.build(value)?;
        let findings = lint_schema(&schema);
        if has_errors(&findings) {
            return Err(SchemaLoadError::Lint { findings });
        }
        for warning in &findings {
            tracing::debug!(%warning, "schema lint warning");
        }
        Ok(schema)
    }

    /// Check, decode, and build a parsed document without linting it.
    ///
    /// Used by tooling that reports lint findings itself.
    pub fn build(&self, value: &Value) -> Result<Schema, SchemaLoadError> {
        self.check_structure(value)?;
        let definition: SchemaDefinition =
            serde_json::from_value(value.clone()).map_err(|e| SchemaLoadError::Decode { reason: e.to_string() })?;
        Ok(Schema::from_definition(definition)?)
    }

    /// Report every structural violation of `value`.
    pub fn check_structure(&self, value: &Value) -> Result<(), SchemaLoadError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(value)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaLoadError::Structure {
                violations: ValidationViolations { violations },
            })
        }
    }
}

/// Read a schema file, choosing JSON or YAML by extension.
pub fn read_document(path: &Path) -> Result<Value, SchemaLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaLoadError::DocumentLoad {
        path: path.display().to_string(),
        reason: format!("cannot read file: {e}"),
    })?;
    parse_document(&content, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Parse text as JSON or YAML into a JSON value tree.
pub fn parse_document(content: &str, format: DocumentFormat, origin: &str) -> Result<Value, SchemaLoadError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| SchemaLoadError::DocumentLoad {
            path: origin.to_string(),
            reason: format!("invalid JSON: {e}"),
        }),
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| SchemaLoadError::DocumentLoad {
                path: origin.to_string(),
                reason: format!("invalid YAML: {e}"),
            })?;
            yaml_to_json_value(&yaml).map_err(|e| SchemaLoadError::DocumentLoad {
                path: origin.to_string(),
                reason: format!("YAML-to-JSON conversion failed: {e}"),
            })
        }
    }
}

/// Convert a YAML value tree to the equivalent JSON value tree.
///
/// Tags are dropped; non-string map keys are stringified.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq.iter().map(yaml_to_json_value).collect::<Result<Vec<_>, _>>().map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn loader() -> SchemaLoader {
        SchemaLoader::new().unwrap()
    }

    #[test]
    fn test_embedded_schema_compiles() {
        assert!(SchemaLoader::new().is_ok());
    }

    #[test]
    fn test_load_single_stage_json() {
        let schema = loader()
            .load_value(&json!({
                "id": "contact",
                "fields": [
                    {"name": "email", "type": "email", "required": true},
                    {"name": "phone", "type": "tel", "attributes": {"pattern": "^0\\d{8,9}$"}}
                ]
            }))
            .unwrap();
        assert_eq!(schema.id(), Some("contact"));
        assert!(!schema.is_multi_stage());
        assert_eq!(schema.fields().len(), 2);
    }

    #[test]
    fn test_load_multi_stage_yaml() {
        let yaml = r#"
id: survey
stages:
  - id: about
    label: About you
    fields:
      - name: name
        type: text
        required: true
      - name: hasPet
        type: checkbox
      - name: petName
        type: text
        showIf: { field: hasPet, equals: true }
  - id: summary
    label: Summary
    type: summary
"#;
        let schema = loader().load_str(yaml, DocumentFormat::Yaml).unwrap();
        assert_eq!(schema.stage_count(), 2);
        assert!(schema.is_summary_stage(1));
        assert_eq!(schema.stage_of("petName"), Some(0));
    }

    #[test]
    fn test_structure_violations_are_collected() {
        let err = loader()
            .load_value(&json!({
                "fields": [
                    {"name": "a"},
                    {"name": "b", "type": "text", "showIf": {"field": "a"}}
                ]
            }))
            .unwrap_err();
        match err {
            SchemaLoadError::Structure { violations } => {
                assert!(violations.len() >= 2);
                assert!(violations.violations().iter().any(|v| v.instance_path == "/fields/0"));
            }
            other => panic!("expected Structure, got {other:?}"),
        }
    }

    #[test]
    fn test_document_without_fields_or_stages_is_rejected() {
        let err = loader().load_value(&json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, SchemaLoadError::Structure { .. }));
    }

    #[test]
    fn test_unknown_field_type_is_a_decode_error() {
        let err = loader()
            .load_value(&json!({"fields": [{"name": "a", "type": "slider"}]}))
            .unwrap_err();
        match err {
            SchemaLoadError::Decode { reason } => assert!(reason.contains("slider")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_name_is_an_integrity_error() {
        let err = loader()
            .load_value(&json!({"fields": [
                {"name": "a", "type": "text"},
                {"name": "a", "type": "email"}
            ]}))
            .unwrap_err();
        assert!(matches!(err, SchemaLoadError::Integrity(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_lint_errors_reject_schema() {
        let err = loader()
            .load_value(&json!({"fields": [
                {"name": "a", "type": "text", "showIf": {"field": "b", "equals": "x"}},
                {"name": "b", "type": "text", "showIf": {"field": "a", "equals": "y"}}
            ]}))
            .unwrap_err();
        match &err {
            SchemaLoadError::Lint { findings } => assert!(has_errors(findings)),
            other => panic!("expected Lint, got {other:?}"),
        }
        assert!(err.to_string().contains("showIf cycle"));
    }

    #[test]
    fn test_build_skips_lint() {
        let value = json!({"fields": [{"name": "a", "type": "text", "showIf": {"field": "a", "equals": "x"}}]});
        assert!(matches!(loader().load_value(&value), Err(SchemaLoadError::Lint { .. })));
        let schema = loader().build(&value).unwrap();
        assert!(has_errors(&lint_schema(&schema)));
    }

    #[test]
    fn test_lint_warnings_do_not_reject() {
        let schema = loader()
            .load_value(&json!({"fields": [{"name": "pick", "type": "select"}]}))
            .unwrap();
        assert_eq!(schema.fields().len(), 1);
    }

    #[test]
    fn test_load_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "fields:\n  - name: agree\n    type: checkbox\n    required: true").unwrap();
        let schema = loader().load_path(&path).unwrap();
        assert!(schema.field("agree").is_some());
    }

    #[test]
    fn test_missing_file_is_a_document_error() {
        let err = loader().load_path(Path::new("/nonexistent/form.json")).unwrap_err();
        assert!(matches!(err, SchemaLoadError::DocumentLoad { .. }));
    }

    #[test]
    fn test_yaml_to_json_conversion() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a: 1\nb: [true, 1.5, x]\n2: null").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json, json!({"a": 1, "b": [true, 1.5, "x"], "2": null}));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/anyOf".into(),
            message: "missing fields".into(),
        };
        assert_eq!(v.to_string(), "  (root): missing fields");
    }
}
