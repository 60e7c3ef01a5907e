//! Field-level and whole-template validation.
//!
//! Rules run in a fixed order and the first failure wins: required-ness,
//! then blank short-circuit, then the type-specific check.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

use formdesk_domain::{Field, FieldType, FieldValue, RecordData, Template};

use crate::FieldErrors;

pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const INVALID_NUMBER: &str = "Please enter a valid number";
pub const INVALID_DATE: &str = "Please enter a valid date";
pub const INVALID_OPTION: &str = "Please select a valid option";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex should compile")
    })
}

pub fn required_message(field: &Field) -> String {
    format!("{} is required", field.label)
}

/// Checks a single value against a field; `None` means the value is acceptable.
pub fn validate(field: &Field, value: Option<&FieldValue>) -> Option<String> {
    let blank = value.map(FieldValue::is_blank).unwrap_or(true);
    if blank {
        return field.required.then(|| required_message(field));
    }
    let value = value?;
    match field.field_type {
        FieldType::Email => (!is_valid_email(value)).then(|| INVALID_EMAIL.to_string()),
        FieldType::Number => (!is_valid_number(value)).then(|| INVALID_NUMBER.to_string()),
        FieldType::Date => (!is_valid_date(value)).then(|| INVALID_DATE.to_string()),
        FieldType::Select => (!is_valid_option(field, value)).then(|| INVALID_OPTION.to_string()),
        FieldType::Text | FieldType::Textarea | FieldType::Password => None,
    }
}

/// Validates every field of `template` against `data`, keyed by field id.
pub fn validate_template(template: &Template, data: &RecordData) -> FieldErrors {
    template
        .fields
        .iter()
        .filter_map(|field| {
            validate(field, data.get(&field.id)).map(|message| (field.id.clone(), message))
        })
        .collect()
}

pub fn is_valid(template: &Template, data: &RecordData) -> bool {
    validate_template(template, data).is_empty()
}

fn is_valid_email(value: &FieldValue) -> bool {
    value
        .as_text()
        .map(|text| email_regex().is_match(text.trim()))
        .unwrap_or(false)
}

fn is_valid_number(value: &FieldValue) -> bool {
    match value {
        FieldValue::Number(number) => number.is_finite(),
        FieldValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false),
        FieldValue::Bool(_) | FieldValue::Null => false,
    }
}

fn is_valid_date(value: &FieldValue) -> bool {
    let Some(text) = value.as_text().map(str::trim) else {
        return false;
    };
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(text).is_ok()
}

fn is_valid_option(field: &Field, value: &FieldValue) -> bool {
    let options = field.options();
    if options.is_empty() {
        return true;
    }
    let candidate = value.display_text();
    options.iter().any(|option| *option == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::text(value)
    }

    #[test]
    fn required_fields_reject_blank_and_missing() {
        for field_type in FieldType::ALL {
            let field = Field::new("f", field_type, "Name").with_required();
            assert_eq!(validate(&field, None).as_deref(), Some("Name is required"));
            assert_eq!(
                validate(&field, Some(&text("  "))).as_deref(),
                Some("Name is required")
            );
            assert_eq!(
                validate(&field, Some(&FieldValue::Null)).as_deref(),
                Some("Name is required")
            );
        }
        let field = Field::new("f", FieldType::Text, "Name").with_required();
        assert_eq!(validate(&field, Some(&text("x"))), None);
    }

    #[test]
    fn optional_blank_values_skip_type_checks() {
        for field_type in FieldType::ALL {
            let field = Field::new("f", field_type, "Anything").with_options(["A"]);
            assert_eq!(validate(&field, Some(&text(""))), None);
            assert_eq!(validate(&field, None), None);
        }
    }

    #[test]
    fn email_rule() {
        let field = Field::new("e", FieldType::Email, "Email");
        assert_eq!(validate(&field, Some(&text("a@b.com"))), None);
        assert_eq!(
            validate(&field, Some(&text("not-an-email"))).as_deref(),
            Some(INVALID_EMAIL)
        );
        assert_eq!(
            validate(&field, Some(&text("a b@c.com"))).as_deref(),
            Some(INVALID_EMAIL)
        );
    }

    #[test]
    fn number_rule_accepts_text_and_numbers() {
        let field = Field::new("n", FieldType::Number, "Age");
        assert_eq!(validate(&field, Some(&text("42"))), None);
        assert_eq!(validate(&field, Some(&text(" -1.5 "))), None);
        assert_eq!(validate(&field, Some(&FieldValue::Number(7.0))), None);
        assert_eq!(
            validate(&field, Some(&text("abc"))).as_deref(),
            Some(INVALID_NUMBER)
        );
        assert_eq!(
            validate(&field, Some(&text("inf"))).as_deref(),
            Some(INVALID_NUMBER)
        );
    }

    #[test]
    fn date_rule() {
        let field = Field::new("d", FieldType::Date, "Start");
        assert_eq!(validate(&field, Some(&text("2024-02-29"))), None);
        assert_eq!(validate(&field, Some(&text("2024-03-01T09:00:00Z"))), None);
        assert_eq!(
            validate(&field, Some(&text("2023-02-29"))).as_deref(),
            Some(INVALID_DATE)
        );
        assert_eq!(
            validate(&field, Some(&text("tomorrow"))).as_deref(),
            Some(INVALID_DATE)
        );
    }

    #[test]
    fn select_rule_checks_membership() {
        let field = Field::new("s", FieldType::Select, "Dept").with_options(["A", "B"]);
        assert_eq!(validate(&field, Some(&text("A"))), None);
        assert_eq!(
            validate(&field, Some(&text("C"))).as_deref(),
            Some(INVALID_OPTION)
        );

        let open = Field::new("s", FieldType::Select, "Dept");
        assert_eq!(validate(&open, Some(&text("anything"))), None);
    }

    #[test]
    fn template_validation_collects_per_field() {
        let template = Template::new("Onboarding")
            .with_field(Field::new("f1", FieldType::Text, "Name").with_required())
            .with_field(Field::new("f2", FieldType::Email, "Email"))
            .with_field(Field::new("f3", FieldType::Textarea, "Notes"));
        let mut data = RecordData::new();
        data.insert("f2".into(), text("nope"));

        let errors = validate_template(&template, &data);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["f1"], "Name is required");
        assert_eq!(errors["f2"], INVALID_EMAIL);
        assert!(!is_valid(&template, &data));

        data.insert("f1".into(), text("Alice"));
        data.insert("f2".into(), text("alice@example.com"));
        assert!(is_valid(&template, &data));
    }
}
