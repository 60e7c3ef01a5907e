//! Domain types representing records captured against a template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::value::{FieldValue, RecordData};

/// A concrete data instance conforming to a template's field set.
///
/// Keys in `data` that no longer match a template field are kept untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "form_template")]
    pub template_id: u64,
    #[serde(default)]
    pub data: RecordData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(template_id: u64) -> Self {
        Self {
            template_id,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.data.insert(field_id.into(), value.into());
        self
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.data.get(field_id)
    }

    /// Fallback label used when no field yields a display name.
    pub fn fallback_name(&self) -> String {
        match self.id {
            Some(id) => format!("Employee #{id}"),
            None => "Employee #new".to_string(),
        }
    }
}

impl Identifiable for Record {
    fn id(&self) -> Option<u64> {
        self.id
    }
}
