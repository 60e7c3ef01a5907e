//! Record display names, filtering and sorting for list views.

use std::{cmp::Ordering, collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};

use formdesk_domain::{FieldType, Record, Template};

use crate::CoreError;

/// Label fragments that mark a field as holding a person's name.
pub const NAME_LABELS: [&str; 6] = [
    "name",
    "full_name",
    "first_name",
    "employee_name",
    "full name",
    "Name",
];

/// Best-effort human-readable name for a record.
///
/// Tries fields whose label looks like a name, then the first TEXT or EMAIL
/// field with a value, then falls back to `Employee #<id>`.
pub fn derive_display_name(record: &Record, template: &Template) -> String {
    let fields = template.ordered_fields();
    let non_blank = |field_id: &str| {
        record
            .value(field_id)
            .filter(|value| !value.is_blank())
            .map(|value| value.display_text())
    };

    let by_label = fields.iter().find_map(|field| {
        let label = field.label.to_lowercase();
        NAME_LABELS
            .iter()
            .any(|candidate| label.contains(&candidate.to_lowercase()))
            .then(|| non_blank(&field.id))
            .flatten()
    });
    if let Some(name) = by_label {
        return name;
    }

    fields
        .iter()
        .filter(|field| matches!(field.field_type, FieldType::Text | FieldType::Email))
        .find_map(|field| non_blank(&field.id))
        .unwrap_or_else(|| record.fallback_name())
}

/// `(label, value)` pairs for every field with a non-blank value, in display order.
pub fn display_data(record: &Record, template: &Template) -> Vec<(String, String)> {
    template
        .ordered_fields()
        .into_iter()
        .filter_map(|field| {
            record
                .value(&field.id)
                .filter(|value| !value.is_blank())
                .map(|value| (field.label.clone(), value.display_text()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "created_at" | "created" => Ok(SortKey::CreatedAt),
            "updated_at" | "updated" => Ok(SortKey::UpdatedAt),
            other => Err(CoreError::Validation(format!("unknown sort key `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CoreError::Validation(format!("unknown sort order `{other}`"))),
        }
    }
}

/// Criteria for a record list. The default lists everything, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub search: Option<String>,
    pub template_id: Option<u64>,
    pub sort: SortKey,
    pub order: SortOrder,
}

/// A record prepared for a list row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow<'a> {
    pub record: &'a Record,
    pub display_name: String,
    /// `None` when the owning template is no longer loaded.
    pub template_name: Option<&'a str>,
}

/// Filters and sorts records. Ties keep input order.
pub fn filter_records<'a>(
    records: &'a [Record],
    templates: &'a [Template],
    query: &RecordQuery,
) -> Vec<RecordRow<'a>> {
    let by_id: HashMap<u64, &Template> = templates
        .iter()
        .filter_map(|template| template.id.map(|id| (id, template)))
        .collect();
    let needle = normalized_query(query.search.as_deref());

    let mut rows: Vec<RecordRow<'a>> = records
        .iter()
        .filter(|record| {
            query
                .template_id
                .map_or(true, |template_id| record.template_id == template_id)
        })
        .map(|record| {
            let template = by_id.get(&record.template_id).copied();
            let display_name = template
                .map(|template| derive_display_name(record, template))
                .unwrap_or_else(|| record.fallback_name());
            (record, template, display_name)
        })
        .filter(|(record, template, display_name)| match needle.as_deref() {
            None => true,
            Some(needle) => record_matches(record, *template, display_name, needle),
        })
        .map(|(record, template, display_name)| RecordRow {
            record,
            display_name,
            template_name: template.map(|template| template.name.as_str()),
        })
        .collect();

    rows.sort_by(|a, b| {
        let ordering = match query.sort {
            SortKey::Name => a
                .display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase()),
            SortKey::CreatedAt => timestamp(a.record.created_at).cmp(&timestamp(b.record.created_at)),
            SortKey::UpdatedAt => timestamp(a.record.updated_at).cmp(&timestamp(b.record.updated_at)),
        };
        query.order.apply(ordering)
    });
    rows
}

fn record_matches(
    record: &Record,
    template: Option<&Template>,
    display_name: &str,
    needle: &str,
) -> bool {
    if display_name.to_lowercase().contains(needle) {
        return true;
    }
    let Some(template) = template else {
        return false;
    };
    if template.name.to_lowercase().contains(needle) {
        return true;
    }
    template.fields.iter().any(|field| {
        record
            .value(&field.id)
            .filter(|value| !value.is_blank())
            .is_some_and(|value| value.display_text().to_lowercase().contains(needle))
    })
}

/// Criteria for the template list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateQuery {
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl Default for TemplateQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: SortKey::Name,
            order: SortOrder::Asc,
        }
    }
}

/// Matches name or description case-insensitively, then sorts.
pub fn filter_templates<'a>(templates: &'a [Template], query: &TemplateQuery) -> Vec<&'a Template> {
    let needle = normalized_query(query.search.as_deref());
    let mut matches: Vec<&Template> = templates
        .iter()
        .filter(|template| match needle.as_deref() {
            None => true,
            Some(needle) => {
                template.name.to_lowercase().contains(needle)
                    || template
                        .description
                        .as_deref()
                        .is_some_and(|description| description.to_lowercase().contains(needle))
            }
        })
        .collect();
    matches.sort_by(|a, b| {
        let ordering = match query.sort {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::CreatedAt => timestamp(a.created_at).cmp(&timestamp(b.created_at)),
            SortKey::UpdatedAt => timestamp(a.updated_at).cmp(&timestamp(b.updated_at)),
        };
        query.order.apply(ordering)
    });
    matches
}

/// Whitespace-only searches match everything; otherwise the text is matched as typed.
fn normalized_query(search: Option<&str>) -> Option<String> {
    search
        .filter(|text| !text.trim().is_empty())
        .map(str::to_lowercase)
}

// Missing timestamps sort as the oldest.
fn timestamp(value: Option<DateTime<Utc>>) -> i64 {
    value.map(|at| at.timestamp_millis()).unwrap_or(0)
}
