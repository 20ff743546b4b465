//! # Scalar Field Values
//!
//! A form state entry is a string, a number, or a boolean. Values keep the
//! type they were entered with; coercion happens only inside validation,
//! so gating conditions can compare strictly.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A scalar value stored under a field name.
///
/// Equality is strict: `Text("true") != Bool(true)` and
/// `Text("5") != Number(5.0)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean, as produced by checkboxes.
    Bool(bool),
    /// Finite number, as committed for number fields after validation.
    Number(f64),
    /// Raw or trimmed text.
    Text(String),
}

impl FieldValue {
    /// Convenience constructor for text values.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Textual form of the value, as a browser would stringify it.
    ///
    /// Integral numbers print without a fractional part (`5`, not `5.0`),
    /// and negative zero prints as `0`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
        }
    }

    /// Truthiness used when coercing to a checkbox flag.
    ///
    /// Empty text, zero, and `false` are falsy; everything else is truthy,
    /// including the text `"false"`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric reading of the value, if it has one.
    ///
    /// Text is parsed with [`parse_number`]; booleans have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) | Self::Bool(_) => None,
            Self::Text(s) => parse_number(s),
        }
    }

    /// Borrow the inner string of a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                // Keep integral numbers integral on the wire: `5`, not `5.0`.
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Parse user-entered text as a finite number.
///
/// Accepts surrounding whitespace, decimal notation with an optional sign,
/// exponent, leading or trailing dot (`+5`, `1e3`, `.5`, `5.`), and unsigned
/// `0x`/`0o`/`0b` integer literals. Returns `None` for empty input and for
/// anything that does not denote a finite number, including `Infinity`
/// and `NaN`.
pub fn parse_number(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() || digits.starts_with(['+', '-']) {
            return None;
        }
        return u128::from_str_radix(digits, radix).ok().map(|v| v as f64);
    }

    // `f64::from_str` also accepts "inf" and "nan" spellings; only digits,
    // signs, dots, and exponents denote numbers here.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }

    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
