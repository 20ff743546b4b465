//! # Message Catalogue
//!
//! Default human-readable messages for each [`ErrorKind`]. A field's own
//! `errorMessages` entry always wins; the catalogue supplies the rest.
//! The `min` and `max` templates substitute `{bound}` with the bound as
//! written in the field's attributes.

use std::fmt;
use std::str::FromStr;

use formstage_core::{ErrorKind, Field};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the numeric bound in `min`/`max` templates.
pub const BOUND_PLACEHOLDER: &str = "{bound}";

/// Languages with a built-in catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Hebrew.
    He,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "he" | "hebrew" => Ok(Self::He),
            other => Err(format!("unsupported locale '{other}' (expected 'en' or 'he')")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::En => "en",
            Self::He => "he",
        })
    }
}

/// Schema-wide default messages, one per error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCatalog {
    pub required: String,
    pub number_invalid: String,
    pub email_invalid: String,
    pub phone_invalid: String,
    pub option_invalid: String,
    pub acceptance: String,
    /// Template containing [`BOUND_PLACEHOLDER`].
    pub min: String,
    /// Template containing [`BOUND_PLACEHOLDER`].
    pub max: String,
}

impl MessageCatalog {
    /// English defaults.
    pub fn english() -> Self {
        Self {
            required: "This field is required".into(),
            number_invalid: "Enter a valid number".into(),
            email_invalid: "Enter a valid email address".into(),
            phone_invalid: "Enter a valid phone number".into(),
            option_invalid: "Choose one of the available options".into(),
            acceptance: "You must accept this to continue".into(),
            min: "Value must be at least {bound}".into(),
            max: "Value must be at most {bound}".into(),
        }
    }

    /// Hebrew defaults.
    pub fn hebrew() -> Self {
        Self {
            required: "שדה חובה".into(),
            number_invalid: "ערך מספרי אינו תקין".into(),
            email_invalid: "כתובת אימייל לא תקינה".into(),
            phone_invalid: "מספר טלפון לא תקין".into(),
            option_invalid: "בחירה אינה תקפה".into(),
            acceptance: "יש לאשר את הסעיף".into(),
            min: "הערך חייב להיות לפחות {bound}".into(),
            max: "הערך חייב להיות עד {bound}".into(),
        }
    }

    /// Built-in catalogue for a locale.
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::He => Self::hebrew(),
        }
    }

    /// Replace the default for one kind.
    pub fn with(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        *self.slot_mut(kind) = message.into();
        self
    }

    /// The default text for a kind, before bound substitution.
    pub fn template(&self, kind: ErrorKind) -> &str {
        match kind {
            ErrorKind::Required => &self.required,
            ErrorKind::NumberInvalid => &self.number_invalid,
            ErrorKind::EmailInvalid => &self.email_invalid,
            ErrorKind::PhoneInvalid => &self.phone_invalid,
            ErrorKind::OptionInvalid => &self.option_invalid,
            ErrorKind::Acceptance => &self.acceptance,
            ErrorKind::Min => &self.min,
            ErrorKind::Max => &self.max,
        }
    }

    /// Resolve the message a field reports for a failure.
    ///
    /// The field's override is used verbatim. Otherwise the catalogue
    /// template is used with `{bound}` replaced when a bound is given.
    pub fn resolve(&self, field: &Field, kind: ErrorKind, bound: Option<&str>) -> String {
        if let Some(custom) = field.message_override(kind) {
            return custom.to_string();
        }
        let template = self.template(kind);
        match bound {
            Some(b) => template.replace(BOUND_PLACEHOLDER, b),
            None => template.to_string(),
        }
    }

    fn slot_mut(&mut self, kind: ErrorKind) -> &mut String {
        match kind {
            ErrorKind::Required => &mut self.required,
            ErrorKind::NumberInvalid => &mut self.number_invalid,
            ErrorKind::EmailInvalid => &mut self.email_invalid,
            ErrorKind::PhoneInvalid => &mut self.phone_invalid,
            ErrorKind::OptionInvalid => &mut self.option_invalid,
            ErrorKind::Acceptance => &mut self.acceptance,
            ErrorKind::Min => &mut self.min,
            ErrorKind::Max => &mut self.max,
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}
