//! # Error Types — Structural Schema Errors
//!
//! Errors raised while turning a decoded schema definition into a usable
//! [`Schema`](crate::Schema). These are authoring errors: they are detected
//! once, at load time, and never during validation of user input.
//!
//! User-input failures (a required field left empty, a number out of range)
//! are not errors in this sense. They are reported as data by the stage
//! validator in `formstage-schema`.

use thiserror::Error;

/// Structural problem in a form schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field declared a `type` outside the supported set.
    #[error("unknown field type '{0}'")]
    UnknownFieldType(String),

    /// A stage declared a `type` other than `summary`.
    #[error("unknown stage type '{0}'")]
    UnknownStageType(String),

    /// A field has an empty `name`, so it cannot be used as a state key.
    #[error("field at position {position} has an empty name")]
    EmptyFieldName {
        /// Zero-based position in the flattened field list.
        position: usize,
    },

    /// Two fields share the same `name`.
    #[error("duplicate field name '{name}'")]
    DuplicateField {
        /// The repeated field name.
        name: String,
    },

    /// A `showIf` condition names a field that does not exist.
    #[error("field '{field}' is gated on unknown field '{target}'")]
    UnknownShowIfTarget {
        /// The gated field.
        field: String,
        /// The missing governing field.
        target: String,
    },

    /// The flattened `fields` list of a multi-stage schema does not match
    /// the concatenation of the stage field lists.
    #[error("flattened field list disagrees with stages at position {position}: {reason}")]
    FlattenedFieldsMismatch {
        /// First position where the lists differ.
        position: usize,
        /// What differs.
        reason: String,
    },
}
