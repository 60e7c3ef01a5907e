//! Wire shapes exchanged with the persistence backend.
//!
//! These mirror the backend's JSON contract: templates are created and
//! updated with a flat field list, records are created with a template
//! reference and updated by replacing `data` wholesale, and failures carry an
//! optional per-field `errors` map.

use std::collections::BTreeMap;

use formdesk_domain::{Field, FieldType, RecordData, Template};
use serde::{Deserialize, Serialize};

/// Generic message shown when a failure carries nothing more specific.
pub const GENERIC_SAVE_FAILURE: &str = "Failed to save form";

/// A field as sent in a template create/update request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldPayload {
    /// Present only for fields that already carry a backend-assigned numeric id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub field_type: FieldType,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldPayload {
    pub fn from_field(field: &Field, order: u32) -> Self {
        Self {
            id: field.id.parse::<u64>().ok(),
            field_type: field.field_type,
            label: field.label.clone(),
            placeholder: field.placeholder.clone().unwrap_or_default(),
            is_required: field.required,
            order,
            options: field.options().to_vec(),
        }
    }
}

/// Body of a template create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplatePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldPayload>,
}

impl TemplatePayload {
    /// Builds the payload, numbering fields by their position in `template.fields`.
    pub fn from_template(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            description: template.description.clone().unwrap_or_default(),
            fields: template
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| FieldPayload::from_field(field, index as u32))
                .collect(),
        }
    }
}

/// Standalone template document produced by the builder's export.
///
/// Same shape as a fetched template minus the server-assigned `id` and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateExport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl TemplateExport {
    pub fn from_template(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            description: template.description.clone(),
            fields: template.fields.clone(),
        }
    }

    pub fn into_template(self) -> Template {
        let mut fields = self.fields;
        for field in &mut fields {
            field.normalize_options();
        }
        Template {
            id: None,
            name: self.name,
            description: self.description,
            fields,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Body of a record create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordCreatePayload {
    pub form_template: u64,
    pub data: RecordData,
}

/// Body of a record update request; `data` replaces the stored mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordUpdatePayload {
    pub data: RecordData,
}

/// Messages attached to one key of an error payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorMessages {
    Many(Vec<String>),
    One(String),
}

impl ErrorMessages {
    pub fn joined(&self) -> String {
        match self {
            ErrorMessages::Many(messages) => messages.join(", "),
            ErrorMessages::One(message) => message.clone(),
        }
    }
}

/// Body returned with a non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ApiErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, ErrorMessages>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiErrorPayload {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::default().with_field_error(field, message)
    }

    /// Appends a message under `field`, keeping earlier ones.
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let errors = self.errors.get_or_insert_with(BTreeMap::new);
        let entry = errors
            .entry(field.into())
            .or_insert_with(|| ErrorMessages::Many(Vec::new()));
        match entry {
            ErrorMessages::Many(messages) => messages.push(message),
            ErrorMessages::One(existing) => {
                let first = std::mem::take(existing);
                *entry = ErrorMessages::Many(vec![first, message]);
            }
        }
        self
    }

    pub fn has_field_errors(&self) -> bool {
        self.errors
            .as_ref()
            .map(|errors| !errors.is_empty())
            .unwrap_or(false)
    }

    /// One message per offending field, else `message`, else `detail`, else `fallback`.
    pub fn user_messages(&self, fallback: &str) -> Vec<String> {
        if let Some(errors) = self.errors.as_ref().filter(|errors| !errors.is_empty()) {
            return errors
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.joined()))
                .collect();
        }
        let text = self
            .message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .or_else(|| {
                self.detail
                    .as_deref()
                    .filter(|detail| !detail.trim().is_empty())
            })
            .unwrap_or(fallback);
        vec![text.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_map_produces_one_message_per_field() {
        let payload: ApiErrorPayload = serde_json::from_str(
            r#"{"errors":{"name":["Name cannot be empty."],"options":"Options cannot be empty."},"message":"ignored"}"#,
        )
        .expect("error payload");
        assert_eq!(
            payload.user_messages("fallback"),
            vec![
                "name: Name cannot be empty.".to_string(),
                "options: Options cannot be empty.".to_string(),
            ]
        );
    }

    #[test]
    fn falls_back_to_message_then_detail_then_generic() {
        let message: ApiErrorPayload =
            serde_json::from_str(r#"{"message":"Boom","detail":"ignored"}"#).expect("message");
        assert_eq!(message.user_messages("x"), vec!["Boom".to_string()]);

        let detail: ApiErrorPayload =
            serde_json::from_str(r#"{"detail":"Not found."}"#).expect("detail");
        assert_eq!(detail.user_messages("x"), vec!["Not found.".to_string()]);

        let empty = ApiErrorPayload::default();
        assert_eq!(
            empty.user_messages(GENERIC_SAVE_FAILURE),
            vec![GENERIC_SAVE_FAILURE.to_string()]
        );
    }

    #[test]
    fn field_payload_keeps_only_numeric_ids() {
        let template = Template::new("T")
            .with_field(Field::new("17", FieldType::Text, "Existing"))
            .with_field(Field::new("field_1_abc", FieldType::Text, "Fresh"));
        let payload = TemplatePayload::from_template(&template);
        assert_eq!(payload.fields[0].id, Some(17));
        assert_eq!(payload.fields[1].id, None);
        assert_eq!(payload.fields[1].order, 1);

        let json = serde_json::to_value(&payload).expect("serialize payload");
        assert!(json["fields"][1].get("id").is_none());
        assert_eq!(json["fields"][0]["options"], serde_json::json!([]));
    }

    #[test]
    fn repeated_field_errors_accumulate() {
        let payload = ApiErrorPayload::field("data", "Name is required")
            .with_field_error("data", "Email must be a valid email");
        assert_eq!(
            payload.user_messages("x"),
            vec!["data: Name is required, Email must be a valid email".to_string()]
        );
    }
}
