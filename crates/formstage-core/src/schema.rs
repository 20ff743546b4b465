//! # Form Schema
//!
//! A schema is either single-stage (a flat `fields` list) or multi-stage
//! (a `stages` list, each with its own fields, plus the flattened `fields`
//! list as a convenience). The invariant
//! `fields == stages.flat_map(|s| s.fields)` is enforced at construction.
//!
//! ```text
//! SchemaDefinition (serde) ──from_definition──▶ Schema (indexed, immutable)
//! ```
//!
//! A stage with `type: "summary"` is a read-only recap. It normally carries
//! no fields.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::Field;

// ─── Stage ───────────────────────────────────────────────────────────

/// Special stage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StageKind {
    /// Read-only recap of everything entered so far.
    Summary,
}

impl FromStr for StageKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            _ => Err(SchemaError::UnknownStageType(s.to_string())),
        }
    }
}

impl TryFrom<String> for StageKind {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StageKind> for String {
    fn from(k: StageKind) -> Self {
        match k {
            StageKind::Summary => "summary".to_string(),
        }
    }
}

/// An ordered group of fields presented as one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage identifier.
    pub id: String,
    /// Stage title.
    #[serde(default)]
    pub label: String,
    /// Special kind, if any.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StageKind>,
    /// Fields in display order.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Stage {
    /// Create an ordinary stage.
    pub fn new(id: impl Into<String>, label: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: None,
            fields,
        }
    }

    /// Create a summary stage.
    pub fn summary(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: Some(StageKind::Summary),
            fields: Vec::new(),
        }
    }

    /// Whether this is a summary stage.
    pub fn is_summary(&self) -> bool {
        self.kind == Some(StageKind::Summary)
    }
}

// ─── Scope ───────────────────────────────────────────────────────────

/// Which fields an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageScope {
    /// The fields of one stage, by zero-based index.
    Stage(usize),
    /// Every field of the form.
    Whole,
}

impl From<Option<usize>> for StageScope {
    fn from(index: Option<usize>) -> Self {
        match index {
            Some(i) => Self::Stage(i),
            None => Self::Whole,
        }
    }
}

impl fmt::Display for StageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(i) => write!(f, "stage {i}"),
            Self::Whole => f.write_str("whole form"),
        }
    }
}

// ─── Definition ──────────────────────────────────────────────────────

/// The schema document as written by its author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Optional schema identifier, used to key drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Stages of a multi-stage form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
    /// All fields; computed from `stages` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
}

// ─── Schema ──────────────────────────────────────────────────────────

/// An immutable, indexed form schema.
///
/// Field lookup by name is O(1). The owning stage of every field is
/// recorded at construction so navigation can find the earliest stage
/// holding an invalid field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDefinition", into = "SchemaDefinition")]
pub struct Schema {
    id: Option<String>,
    stages: Vec<Stage>,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    owners: Vec<usize>,
}

impl Schema {
    /// Build a schema from its definition, enforcing structural invariants.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::FlattenedFieldsMismatch`] if a multi-stage definition
    ///   supplies a `fields` list that differs from the stage flattening.
    /// - [`SchemaError::EmptyFieldName`] / [`SchemaError::DuplicateField`] if
    ///   names cannot serve as unique state keys.
    /// - [`SchemaError::UnknownShowIfTarget`] if a condition names a field
    ///   that does not exist.
    pub fn from_definition(def: SchemaDefinition) -> Result<Self, SchemaError> {
        let stages = def.stages.unwrap_or_default();

        let (fields, owners) = if stages.is_empty() {
            let fields = def.fields.unwrap_or_default();
            let owners = vec![0; fields.len()];
            (fields, owners)
        } else {
            let mut flattened = Vec::new();
            let mut owners = Vec::new();
            for (i, stage) in stages.iter().enumerate() {
                for field in &stage.fields {
                    flattened.push(field.clone());
                    owners.push(i);
                }
            }
            if let Some(provided) = def.fields {
                check_flattened(&flattened, &provided)?;
            }
            (flattened, owners)
        };

        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName { position });
            }
            if index.insert(field.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        for field in &fields {
            if let Some(cond) = &field.show_if {
                if !index.contains_key(&cond.field) {
                    return Err(SchemaError::UnknownShowIfTarget {
                        field: field.name.clone(),
                        target: cond.field.clone(),
                    });
                }
            }
        }

        Ok(Self {
            id: def.id,
            stages,
            fields,
            index,
            owners,
        })
    }

    /// Build a single-stage schema from a field list.
    pub fn single_stage(id: Option<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        Self::from_definition(SchemaDefinition {
            id,
            stages: None,
            fields: Some(fields),
        })
    }

    /// Build a multi-stage schema, computing the flattened field list.
    pub fn multi_stage(id: Option<String>, stages: Vec<Stage>) -> Result<Self, SchemaError> {
        Self::from_definition(SchemaDefinition {
            id,
            stages: Some(stages),
            fields: None,
        })
    }

    /// The schema identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether the schema has at least one stage.
    pub fn is_multi_stage(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Number of navigable stages; a single-stage schema counts as one.
    pub fn stage_count(&self) -> usize {
        self.stages.len().max(1)
    }

    /// All stages (empty for a single-stage schema).
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// A stage by index.
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Whether the stage at `index` is a summary stage.
    pub fn is_summary_stage(&self, index: usize) -> bool {
        self.stage(index).is_some_and(Stage::is_summary)
    }

    /// Every field, in form order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// A field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Position of a field in the flattened list.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of the stage that owns a field (0 for single-stage schemas).
    pub fn stage_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|&i| self.owners[i])
    }

    /// The fields an operation on `scope` considers.
    ///
    /// For a multi-stage schema, an out-of-range stage index yields no
    /// fields. A single-stage schema has only one field list, so every
    /// stage index yields all of it.
    pub fn fields_in(&self, scope: StageScope) -> &[Field] {
        match scope {
            StageScope::Stage(i) if self.is_multi_stage() => self
                .stages
                .get(i)
                .map(|s| s.fields.as_slice())
                .unwrap_or(&[]),
            _ => &self.fields,
        }
    }

    /// Back to a serializable definition.
    pub fn to_definition(&self) -> SchemaDefinition {
        SchemaDefinition {
            id: self.id.clone(),
            stages: if self.stages.is_empty() {
                None
            } else {
                Some(self.stages.clone())
            },
            fields: Some(self.fields.clone()),
        }
    }
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDefinition) -> Result<Self, Self::Error> {
        Self::from_definition(def)
    }
}

impl From<Schema> for SchemaDefinition {
    fn from(schema: Schema) -> Self {
        schema.to_definition()
    }
}

fn check_flattened(expected: &[Field], provided: &[Field]) -> Result<(), SchemaError> {
    for (position, (e, p)) in expected.iter().zip(provided).enumerate() {
        if e.name != p.name {
            return Err(SchemaError::FlattenedFieldsMismatch {
                position,
                reason: format!("expected '{}', found '{}'", e.name, p.name),
            });
        }
        if e != p {
            return Err(SchemaError::FlattenedFieldsMismatch {
                position,
                reason: format!("field '{}' differs from its stage definition", e.name),
            });
        }
    }
    if expected.len() != provided.len() {
        return Err(SchemaError::FlattenedFieldsMismatch {
            position: expected.len().min(provided.len()),
            reason: format!(
                "stages define {} fields, flattened list has {}",
                expected.len(),
                provided.len()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use serde_json::json;

    fn two_stage() -> Schema {
        Schema::multi_stage(
            Some("demo".into()),
            vec![
                Stage::new(
                    "first",
                    "First",
                    vec![
                        Field::new("a", FieldType::Checkbox),
                        Field::new("intro", FieldType::PlainText),
                    ],
                ),
                Stage::new(
                    "second",
                    "Second",
                    vec![Field::new("b", FieldType::Text).show_if("a", true)],
                ),
                Stage::summary("summary", "Summary"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_flattened_fields_are_computed() {
        let schema = two_stage();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "intro", "b"]);
        assert!(schema.is_multi_stage());
        assert_eq!(schema.stage_count(), 3);
        assert!(schema.is_summary_stage(2));
    }

    #[test]
    fn test_lookup_and_ownership() {
        let schema = two_stage();
        assert_eq!(schema.field("b").unwrap().field_type, FieldType::Text);
        assert_eq!(schema.stage_of("a"), Some(0));
        assert_eq!(schema.stage_of("b"), Some(1));
        assert_eq!(schema.stage_of("missing"), None);
        assert_eq!(schema.position_of("b"), Some(2));
    }

    #[test]
    fn test_fields_in_scope() {
        let schema = two_stage();
        assert_eq!(schema.fields_in(StageScope::Stage(1)).len(), 1);
        assert_eq!(schema.fields_in(StageScope::Stage(2)).len(), 0);
        assert_eq!(schema.fields_in(StageScope::Stage(9)).len(), 0);
        assert_eq!(schema.fields_in(StageScope::Whole).len(), 3);
    }

    #[test]
    fn test_single_stage_ignores_stage_index() {
        let schema = Schema::single_stage(
            None,
            vec![Field::new("x", FieldType::Text), Field::new("y", FieldType::Text)],
        )
        .unwrap();
        assert!(!schema.is_multi_stage());
        assert_eq!(schema.stage_count(), 1);
        assert_eq!(schema.fields_in(StageScope::Stage(0)).len(), 2);
        assert_eq!(schema.fields_in(StageScope::Stage(3)).len(), 2);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Schema::single_stage(
            None,
            vec![Field::new("x", FieldType::Text), Field::new("x", FieldType::Number)],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField { name: "x".into() });
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = Schema::single_stage(None, vec![Field::new(" ", FieldType::Text)]).unwrap_err();
        assert_eq!(err, SchemaError::EmptyFieldName { position: 0 });
    }

    #[test]
    fn test_unknown_show_if_target_rejected() {
        let err = Schema::single_stage(
            None,
            vec![Field::new("b", FieldType::Text).show_if("ghost", "yes")],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownShowIfTarget { target, .. } if target == "ghost"));
    }

    #[test]
    fn test_mismatched_flattened_list_rejected() {
        let def: SchemaDefinition = serde_json::from_value(json!({
            "stages": [{"id": "s", "label": "S", "fields": [{"name": "a", "type": "text"}]}],
            "fields": [{"name": "b", "type": "text"}]
        }))
        .unwrap();
        let err = Schema::from_definition(def).unwrap_err();
        assert!(matches!(err, SchemaError::FlattenedFieldsMismatch { position: 0, .. }));
    }

    #[test]
    fn test_matching_flattened_list_accepted() {
        let def: SchemaDefinition = serde_json::from_value(json!({
            "id": "x",
            "stages": [{"id": "s", "label": "S", "fields": [{"name": "a", "type": "text"}]}],
            "fields": [{"name": "a", "type": "text"}]
        }))
        .unwrap();
        let schema = Schema::from_definition(def).unwrap();
        assert_eq!(schema.id(), Some("x"));
    }

    #[test]
    fn test_schema_serde_goes_through_definition() {
        let schema = two_stage();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["stages"][2]["type"], "summary");
        assert_eq!(value["fields"].as_array().unwrap().len(), 3);
        let back: Schema = serde_json::from_value(value).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_unknown_stage_type_rejected() {
        let result: Result<SchemaDefinition, _> = serde_json::from_value(json!({
            "stages": [{"id": "s", "type": "wizard", "fields": []}]
        }));
        assert!(result.is_err());
    }
}
