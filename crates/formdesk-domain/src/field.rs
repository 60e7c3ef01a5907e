//! Domain types describing a single form field.

use std::fmt;

use serde::{de::Deserializer, Deserialize, Serialize, Serializer};

use crate::value::FieldValue;

/// Options seeded into a freshly added SELECT field.
pub const DEFAULT_SELECT_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

/// Closed set of input kinds a template field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    Text,
    Number,
    Email,
    Password,
    Date,
    Textarea,
    Select,
}

impl FieldType {
    /// Every field type in palette order.
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Email,
        FieldType::Password,
        FieldType::Date,
        FieldType::Textarea,
        FieldType::Select,
    ];

    /// Wire representation (`TEXT`, `NUMBER`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Email => "EMAIL",
            FieldType::Password => "PASSWORD",
            FieldType::Date => "DATE",
            FieldType::Textarea => "TEXTAREA",
            FieldType::Select => "SELECT",
        }
    }

    /// Human-friendly palette label.
    pub fn label(self) -> &'static str {
        match self {
            FieldType::Text => "Text Input",
            FieldType::Number => "Number",
            FieldType::Email => "Email",
            FieldType::Password => "Password",
            FieldType::Date => "Date",
            FieldType::Textarea => "Textarea",
            FieldType::Select => "Select Dropdown",
        }
    }

    /// Parses the wire representation, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        FieldType::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
    }

    /// Returns `true` for the one type that carries an options list.
    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Select)
    }

    fn from_value(value: Option<String>) -> Self {
        match value {
            Some(raw) => FieldType::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(field_type = %raw, "unrecognised field type, using TEXT");
                FieldType::Text
            }),
            None => FieldType::Text,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(FieldType::from_value(value))
    }
}

/// One typed, labeled, optionally-required slot within a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: String,
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "is_required", default)]
    pub required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            placeholder: None,
            required: false,
            order: 0,
            options: field_type.has_options().then(Vec::new),
        }
    }

    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Replaces the option list. Ignored for non-SELECT fields.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.field_type.has_options() {
            self.options = Some(options.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Changes the field type while keeping `options` present only for SELECT.
    pub fn set_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
        if field_type.has_options() {
            self.options.get_or_insert_with(Vec::new);
        } else {
            self.options = None;
        }
    }

    /// Options in listed order; empty for non-SELECT fields.
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Restores the options⇔SELECT invariant after deserialisation.
    pub fn normalize_options(&mut self) {
        let field_type = self.field_type;
        self.set_type(field_type);
    }

    /// Placeholder text, falling back to the label when unset or blank.
    pub fn placeholder_or_label(&self) -> &str {
        match self.placeholder.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.label,
        }
    }

    /// Converts raw user input into a value, using the field type as the source of truth.
    pub fn decode(&self, raw: &str) -> FieldValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Text(raw.to_string());
        }
        match self.field_type {
            // Only text that survives the numeric round trip becomes a Number;
            // zero-padded codes and long digit strings stay as typed.
            FieldType::Number => match trimmed.parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    let value = FieldValue::Number(number);
                    if value.to_string() == trimmed {
                        value
                    } else {
                        FieldValue::Text(trimmed.to_string())
                    }
                }
                _ => FieldValue::Text(raw.to_string()),
            },
            FieldType::Date | FieldType::Email | FieldType::Select => {
                FieldValue::Text(trimmed.to_string())
            }
            _ => FieldValue::Text(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_parses_case_insensitively() {
        assert_eq!(FieldType::parse("select"), Some(FieldType::Select));
        assert_eq!(FieldType::parse(" Email "), Some(FieldType::Email));
        assert_eq!(FieldType::parse("checkbox"), None);
    }

    #[test]
    fn unknown_wire_type_falls_back_to_text() {
        let field: Field =
            serde_json::from_str(r#"{"id":"f1","field_type":"RADIO","label":"Pick"}"#)
                .expect("deserialize field");
        assert_eq!(field.field_type, FieldType::Text);
        assert!(!field.required);
    }

    #[test]
    fn options_follow_select_type() {
        let mut field = Field::new("f1", FieldType::Text, "Dept");
        assert!(field.options.is_none());

        field.set_type(FieldType::Select);
        assert_eq!(field.options, Some(Vec::new()));

        field = field.with_options(["Eng", "Sales"]);
        field.set_type(FieldType::Textarea);
        assert!(field.options.is_none());
    }

    #[test]
    fn decode_stores_numbers_for_number_fields() {
        let field = Field::new("age", FieldType::Number, "Age");
        assert_eq!(field.decode("42"), FieldValue::Number(42.0));
        assert_eq!(field.decode(" 3.5 "), FieldValue::Number(3.5));
        assert_eq!(field.decode("4x"), FieldValue::Text("4x".into()));

        let text = Field::new("code", FieldType::Text, "Code");
        assert_eq!(text.decode("42"), FieldValue::Text("42".into()));
    }

    #[test]
    fn decode_keeps_digits_a_number_cannot_hold() {
        let field = Field::new("badge", FieldType::Number, "Badge");
        assert_eq!(
            field.decode("12345678901234567890"),
            FieldValue::Text("12345678901234567890".into())
        );
        assert_eq!(field.decode(" 007 "), FieldValue::Text("007".into()));
        assert_eq!(field.decode("1e3"), FieldValue::Text("1e3".into()));
    }

    #[test]
    fn serializes_wire_names() {
        let field = Field::new("f1", FieldType::Select, "Dept")
            .with_required()
            .with_options(["Eng"]);
        let json = serde_json::to_value(&field).expect("serialize field");
        assert_eq!(json["field_type"], "SELECT");
        assert_eq!(json["is_required"], true);
        assert_eq!(json["options"][0], "Eng");
    }
}
