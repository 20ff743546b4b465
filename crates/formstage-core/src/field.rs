//! # Field Descriptors
//!
//! A field is a named, typed input. Its `name` is the key it occupies in
//! [`FormState`](crate::FormState). Display-only properties (label,
//! placeholder, helper text, plain-text title and body) are carried so a
//! renderer can draw the field, but validation ignores them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::value::FieldValue;

// ─── Field Type ──────────────────────────────────────────────────────

/// The closed set of field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Email address, checked against `local@domain.tld`.
    Email,
    /// Telephone number, optionally checked against `attributes.pattern`.
    Tel,
    /// Number, entered as text and committed as a number.
    Number,
    /// Date, kept as text.
    Date,
    /// Multi-line text.
    Textarea,
    /// Drop-down choice among `options`.
    Select,
    /// Radio choice among `options`.
    Radio,
    /// Boolean acceptance box.
    Checkbox,
    /// Inline informational content; carries no state.
    PlainText,
}

impl FieldType {
    /// All field types in declaration order.
    pub const ALL: [FieldType; 10] = [
        Self::Text,
        Self::Email,
        Self::Tel,
        Self::Number,
        Self::Date,
        Self::Textarea,
        Self::Select,
        Self::Radio,
        Self::Checkbox,
        Self::PlainText,
    ];

    /// Canonical schema spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Number => "number",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::PlainText => "plain text",
        }
    }

    /// Whether the type is informational content without state.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::PlainText)
    }

    /// Whether the value must be one of the field's `options`.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "email" => Ok(Self::Email),
            "tel" => Ok(Self::Tel),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            "radio" => Ok(Self::Radio),
            "checkbox" => Ok(Self::Checkbox),
            "plain text" | "plaintext" => Ok(Self::PlainText),
            _ => Err(SchemaError::UnknownFieldType(s.to_string())),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = SchemaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Error Kinds ─────────────────────────────────────────────────────

/// The kinds of user-input failure a field can report.
///
/// The serialized spelling is the key used in a field's `errorMessages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// A required value is empty.
    Required,
    /// A number field holds text that is not a finite number.
    NumberInvalid,
    /// An email field does not look like `local@domain.tld`.
    EmailInvalid,
    /// A tel field does not match its pattern.
    PhoneInvalid,
    /// A choice field holds a value outside its options.
    OptionInvalid,
    /// A required checkbox is not checked.
    Acceptance,
    /// A number is below `attributes.min`.
    Min,
    /// A number is above `attributes.max`.
    Max,
}

impl ErrorKind {
    /// All error kinds.
    pub const ALL: [ErrorKind; 8] = [
        Self::Required,
        Self::NumberInvalid,
        Self::EmailInvalid,
        Self::PhoneInvalid,
        Self::OptionInvalid,
        Self::Acceptance,
        Self::Min,
        Self::Max,
    ];

    /// Key under which a field overrides the message for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::NumberInvalid => "numberInvalid",
            Self::EmailInvalid => "emailInvalid",
            Self::PhoneInvalid => "phoneInvalid",
            Self::OptionInvalid => "optionInvalid",
            Self::Acceptance => "acceptance",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Look up a kind by its override key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Conditions, Options, Attributes ─────────────────────────────────

/// Visibility predicate: the field is shown only while the governing
/// field holds exactly `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowIf {
    /// Name of the governing field.
    pub field: String,
    /// Value the governing field must hold, compared strictly.
    pub equals: FieldValue,
}

/// One allowed choice of a select or radio field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    /// `{label, value}` form.
    Labeled {
        /// Text shown to the user.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        /// Value stored when chosen.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<FieldValue>,
    },
    /// Bare scalar: label and value are the same.
    Plain(FieldValue),
}

impl FieldOption {
    /// The stored value as trimmed text; an option without a value is `""`.
    pub fn value_text(&self) -> String {
        match self {
            Self::Plain(v) => v.to_text().trim().to_string(),
            Self::Labeled { value, .. } => value
                .as_ref()
                .map(|v| v.to_text().trim().to_string())
                .unwrap_or_default(),
        }
    }

    /// Text to show for the option, falling back to its value.
    pub fn label_text(&self) -> String {
        match self {
            Self::Labeled {
                label: Some(label), ..
            } => label.clone(),
            _ => self.value_text(),
        }
    }
}

/// Free-form input attributes (`min`, `max`, `step`, `pattern`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, FieldValue>);

impl Attributes {
    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Set an attribute, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Lower bound for number fields, if declared and non-empty.
    pub fn min(&self) -> Option<&FieldValue> {
        self.non_empty("min")
    }

    /// Upper bound for number fields, if declared and non-empty.
    pub fn max(&self) -> Option<&FieldValue> {
        self.non_empty("max")
    }

    /// Pattern for tel fields, if declared and non-empty.
    pub fn pattern(&self) -> Option<&str> {
        self.non_empty("pattern").and_then(FieldValue::as_str)
    }

    /// Iterate over all attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Whether no attributes are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn non_empty(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name).filter(|v| !v.is_blank())
    }
}

// ─── Field ───────────────────────────────────────────────────────────

/// A single named, typed input descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique name; the state key.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Label shown next to the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Helper text shown under the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_text: Option<String>,
    /// Heading of a plain-text block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body of a plain-text block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Visible rows of a textarea.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Allowed choices for select and radio fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    /// Input attributes.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Per-kind message overrides, keyed by [`ErrorKind::as_str`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub error_messages: BTreeMap<String, String>,
    /// Visibility predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
}

impl Field {
    /// A field with only a name and type set.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            label: None,
            placeholder: None,
            helper_text: None,
            title: None,
            text: None,
            rows: None,
            required: false,
            options: None,
            attributes: Attributes::default(),
            error_messages: BTreeMap::new(),
            show_if: None,
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Gate the field on another field's exact value.
    pub fn show_if(mut self, field: impl Into<String>, equals: impl Into<FieldValue>) -> Self {
        self.show_if = Some(ShowIf {
            field: field.into(),
            equals: equals.into(),
        });
        self
    }

    /// Set an input attribute.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Set the allowed choices.
    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Override the message for one error kind.
    pub fn message(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.error_messages.insert(kind.as_str().to_string(), message.into());
        self
    }

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the field is informational content without state.
    pub fn is_plain_text(&self) -> bool {
        self.field_type.is_plain_text()
    }

    /// The field's own message for `kind`, if it overrides the default.
    pub fn message_override(&self, kind: ErrorKind) -> Option<&str> {
        self.error_messages.get(kind.as_str()).map(String::as_str)
    }

    /// Text to show for the field, falling back to its name.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.name)
    }
}
