//! # Payload Builder
//!
//! The submission payload is the projection of state onto the visible,
//! stateful fields of the whole form. Values of hidden fields, plain-text
//! fields, and keys that name no field are never included, even if stale
//! data remained in state.

use std::collections::BTreeMap;

use formstage_core::{FieldValue, FormState, Schema, StageScope};
use serde::Serialize;

use crate::visibility::visible_fields;

/// The JSON body handed to the submission transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, FieldValue>);

impl Payload {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Serialize as the request body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Project `state` onto the currently visible fields of the whole form.
pub fn build_submission_payload(schema: &Schema, state: &FormState) -> Payload {
    Payload(
        visible_fields(schema, state, StageScope::Whole)
            .into_iter()
            .filter_map(|f| state.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect(),
    )
}
