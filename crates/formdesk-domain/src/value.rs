//! Scalar values stored in a record's data mapping.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Record data keyed by `Field::id`. An absent key is equivalent to an empty value.
pub type RecordData = BTreeMap<String, FieldValue>;

/// A single scalar captured for a field.
///
/// Serialised untagged so the wire shape stays a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Null, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Stringified form used for display, search and option matching.
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{value:.0}")
                } else {
                    write!(f, "{value}")
                }
            }
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Returns `true` when the key is absent or its value is blank.
pub fn is_blank_entry(data: &RecordData, field_id: &str) -> bool {
    data.get(field_id).map(FieldValue::is_blank).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_covers_null_and_whitespace() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::text("   ").is_blank());
        assert!(!FieldValue::text("x").is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(FieldValue::Number(42.0).to_string(), "42");
        assert_eq!(FieldValue::Number(3.5).to_string(), "3.5");
    }

    #[test]
    fn deserializes_plain_json_scalars() {
        let data: RecordData =
            serde_json::from_str(r#"{"a":"Alice","b":31,"c":null,"d":true}"#).expect("parse");
        assert_eq!(data["a"], FieldValue::text("Alice"));
        assert_eq!(data["b"], FieldValue::Number(31.0));
        assert_eq!(data["c"], FieldValue::Null);
        assert_eq!(data["d"], FieldValue::Bool(true));
        assert!(is_blank_entry(&data, "c"));
        assert!(is_blank_entry(&data, "missing"));
    }
}
