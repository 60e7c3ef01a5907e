//! Domain types representing form templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::field::Field;

/// A named, ordered schema of fields defining the shape of records created against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    /// Fields sorted by `order`; ties keep their stored sequence.
    pub fn ordered_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.order);
        fields
    }

    /// Rewrites every field's `order` to its current index.
    pub fn renumber(&mut self) {
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index as u32;
        }
    }

    pub fn required_count(&self) -> usize {
        self.fields.iter().filter(|field| field.required).count()
    }

    /// Returns `true` when `order` equals `[0, 1, .., n-1]` in stored sequence.
    pub fn is_contiguous(&self) -> bool {
        self.fields
            .iter()
            .enumerate()
            .all(|(index, field)| field.order as usize == index)
    }
}

impl Identifiable for Template {
    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Displayable for Template {
    fn display_label(&self) -> String {
        let count = self.fields.len();
        format!(
            "{} ({} field{})",
            self.name,
            count,
            if count == 1 { "" } else { "s" }
        )
    }
}
