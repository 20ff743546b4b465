//! # formstage-core — Foundational Types for Staged Forms
//!
//! This crate defines the static description of a multi-stage form and the
//! mutable state a user fills in. Every other crate in the workspace depends
//! on `formstage-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Closed field types.** `FieldType` is an exhaustive enum. A schema that
//!    names an unknown type fails to decode instead of silently falling back
//!    to free text.
//!
//! 2. **Scalar values only.** `FieldValue` is a string, number, or boolean.
//!    Equality is type-sensitive: the text `"true"` never equals the boolean
//!    `true`, which is what `showIf` gating relies on.
//!
//! 3. **Validated schemas.** `Schema` can only be built through
//!    [`Schema::from_definition`], which indexes field names once and rejects
//!    duplicate names, dangling `showIf` targets, and a flattened `fields`
//!    list that disagrees with the stages.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formstage-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod field;
pub mod schema;
pub mod state;
pub mod value;

pub use error::SchemaError;
pub use field::{Attributes, ErrorKind, Field, FieldOption, FieldType, ShowIf};
pub use schema::{Schema, SchemaDefinition, Stage, StageKind, StageScope};
pub use state::FormState;
pub use value::{parse_number, FieldValue};
