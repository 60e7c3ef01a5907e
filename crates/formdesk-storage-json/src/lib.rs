//! Filesystem-backed JSON document store for templates and records.
//!
//! Plays the part of the authoritative backend: every payload is
//! re-validated, ids and timestamps are assigned here, and failures are
//! reported as `CoreError::Rejected` carrying a per-field error map.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use formdesk_core::{
    api::{ApiErrorPayload, FieldPayload, RecordCreatePayload, RecordUpdatePayload, TemplatePayload},
    storage::{RecordStore, RecordSubmission, RecordSubmitter, TemplateStore},
    validator, CoreError, RemoteError,
};
use formdesk_domain::{Field, FieldType, FieldValue, Record, RecordData, Template};

const STORE_FILE: &str = "formdesk.json";
const TMP_SUFFIX: &str = "tmp";
const BAD_REQUEST: u16 = 400;

/// Everything the store persists, kept in a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    next_template_id: u64,
    #[serde(default)]
    next_field_id: u64,
    #[serde(default)]
    next_record_id: u64,
    #[serde(default)]
    templates: Vec<Template>,
    #[serde(default)]
    records: Vec<Record>,
}

impl StoreDocument {
    fn allocate_template_id(&mut self) -> u64 {
        let highest = max_id(self.templates.iter().map(|template| template.id));
        self.next_template_id = self.next_template_id.max(highest) + 1;
        self.next_template_id
    }

    fn allocate_record_id(&mut self) -> u64 {
        let highest = max_id(self.records.iter().map(|record| record.id));
        self.next_record_id = self.next_record_id.max(highest) + 1;
        self.next_record_id
    }

    fn allocate_field_id(&mut self) -> String {
        let highest = self
            .templates
            .iter()
            .flat_map(|template| template.fields.iter())
            .filter_map(|field| field.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_field_id = self.next_field_id.max(highest) + 1;
        self.next_field_id.to_string()
    }

    fn template(&self, id: u64) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == Some(id))
    }

    fn record_index(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|record| record.id == Some(id))
    }
}

fn max_id(ids: impl Iterator<Item = Option<u64>>) -> u64 {
    ids.flatten().max().unwrap_or(0)
}

/// JSON persistence rooted at a data directory.
pub struct JsonFormStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFormStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.join(STORE_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("store lock poisoned".into()))
    }

    fn read(&self) -> Result<StoreDocument, CoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
    }

    fn write(&self, document: &StoreDocument) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "store written");
        Ok(())
    }

    fn save_template(
        &self,
        id: Option<u64>,
        payload: &TemplatePayload,
    ) -> Result<Template, CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let existing = match id {
            Some(id) => Some(
                document
                    .template(id)
                    .cloned()
                    .ok_or_else(|| template_missing(id))?,
            ),
            None => None,
        };

        let cleaned = check_template(&document, id, payload).map_err(reject)?;
        let now = Utc::now();
        let template_id = match id {
            Some(id) => id,
            None => document.allocate_template_id(),
        };
        let known_ids: HashSet<&str> = existing
            .as_ref()
            .map(|template| template.fields.iter().map(|f| f.id.as_str()).collect())
            .unwrap_or_default();
        let keep: Vec<Option<String>> = cleaned
            .iter()
            .map(|field| {
                field
                    .id
                    .map(|id| id.to_string())
                    .filter(|id| known_ids.contains(id.as_str()))
            })
            .collect();

        let mut fields = Vec::with_capacity(cleaned.len());
        for (index, (field, kept)) in cleaned.iter().zip(keep).enumerate() {
            let field_id = match kept {
                Some(id) => id,
                None => document.allocate_field_id(),
            };
            let mut stored = Field::new(field_id, field.field_type, field.label.trim())
                .with_order(index as u32)
                .with_options(field.options.clone());
            stored.required = field.is_required;
            if !field.placeholder.trim().is_empty() {
                stored.placeholder = Some(field.placeholder.clone());
            }
            fields.push(stored);
        }

        let description = Some(payload.description.trim().to_string()).filter(|d| !d.is_empty());
        let template = Template {
            id: Some(template_id),
            name: payload.name.trim().to_string(),
            description,
            fields,
            created_at: existing
                .as_ref()
                .and_then(|template| template.created_at)
                .or(Some(now)),
            updated_at: Some(now),
        };

        match document
            .templates
            .iter_mut()
            .find(|stored| stored.id == Some(template_id))
        {
            Some(stored) => *stored = template.clone(),
            None => document.templates.push(template.clone()),
        }
        self.write(&document)?;
        info!(id = template_id, name = %template.name, "template stored");
        Ok(template)
    }
}

impl TemplateStore for JsonFormStore {
    fn list_templates(&self) -> Result<Vec<Template>, CoreError> {
        let _guard = self.guard()?;
        let mut templates = self.read()?.templates;
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    fn get_template(&self, id: u64) -> Result<Template, CoreError> {
        let _guard = self.guard()?;
        self.read()?
            .template(id)
            .cloned()
            .ok_or_else(|| template_missing(id))
    }

    fn create_template(&self, payload: &TemplatePayload) -> Result<Template, CoreError> {
        self.save_template(None, payload)
    }

    fn update_template(&self, id: u64, payload: &TemplatePayload) -> Result<Template, CoreError> {
        self.save_template(Some(id), payload)
    }

    fn delete_template(&self, id: u64) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        if document.template(id).is_none() {
            return Err(template_missing(id));
        }
        document.templates.retain(|template| template.id != Some(id));
        let before = document.records.len();
        document.records.retain(|record| record.template_id != id);
        let cascaded = before - document.records.len();
        self.write(&document)?;
        info!(id, cascaded, "template deleted");
        Ok(())
    }
}

impl RecordStore for JsonFormStore {
    fn list_records(&self, template_id: Option<u64>) -> Result<Vec<Record>, CoreError> {
        let _guard = self.guard()?;
        let mut records: Vec<Record> = self
            .read()?
            .records
            .into_iter()
            .filter(|record| template_id.map_or(true, |id| record.template_id == id))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn get_record(&self, id: u64) -> Result<Record, CoreError> {
        let _guard = self.guard()?;
        let document = self.read()?;
        document
            .record_index(id)
            .map(|index| document.records[index].clone())
            .ok_or_else(|| record_missing(id))
    }

    fn create_record(&self, payload: &RecordCreatePayload) -> Result<Record, CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let template = document
            .template(payload.form_template)
            .ok_or_else(|| unknown_template_reference(payload.form_template))?;
        check_record(template, &payload.data).map_err(reject)?;

        let now = Utc::now();
        let record = Record {
            id: Some(document.allocate_record_id()),
            template_id: payload.form_template,
            data: payload.data.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        document.records.push(record.clone());
        self.write(&document)?;
        info!(id = ?record.id, template = payload.form_template, "record created");
        Ok(record)
    }

    fn update_record(&self, id: u64, payload: &RecordUpdatePayload) -> Result<Record, CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let index = document.record_index(id).ok_or_else(|| record_missing(id))?;
        let template_id = document.records[index].template_id;
        let template = document
            .template(template_id)
            .ok_or_else(|| unknown_template_reference(template_id))?;
        check_record(template, &payload.data).map_err(reject)?;

        let record = &mut document.records[index];
        record.data = payload.data.clone();
        record.updated_at = Some(Utc::now());
        let updated = record.clone();
        self.write(&document)?;
        info!(id, "record updated");
        Ok(updated)
    }

    fn delete_record(&self, id: u64) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let index = document.record_index(id).ok_or_else(|| record_missing(id))?;
        document.records.remove(index);
        self.write(&document)?;
        info!(id, "record deleted");
        Ok(())
    }

    fn delete_records(&self, ids: &[u64]) -> Result<usize, CoreError> {
        let _guard = self.guard()?;
        let mut document = self.read()?;
        let before = document.records.len();
        document
            .records
            .retain(|record| record.id.map_or(true, |id| !ids.contains(&id)));
        let removed = before - document.records.len();
        if removed > 0 {
            self.write(&document)?;
        }
        info!(requested = ids.len(), removed, "records deleted");
        Ok(removed)
    }
}

impl RecordSubmitter for JsonFormStore {
    fn submit_record(&mut self, submission: RecordSubmission) -> Result<Record, CoreError> {
        submission.apply(&*self)
    }
}

/// Server-side template checks. Returns the fields with SELECT options cleaned.
fn check_template(
    document: &StoreDocument,
    id: Option<u64>,
    payload: &TemplatePayload,
) -> Result<Vec<FieldPayload>, ApiErrorPayload> {
    let mut errors = ApiErrorPayload::default();

    let name = payload.name.trim();
    if name.is_empty() {
        errors = errors.with_field_error("name", "Name cannot be empty or whitespace.");
    } else if document.templates.iter().any(|template| {
        template.id != id && template.name.trim().eq_ignore_ascii_case(name)
    }) {
        errors = errors.with_field_error("name", "A form template with this name already exists.");
    }

    if payload.fields.is_empty() {
        errors = errors.with_field_error("fields", "At least one field is required.");
    }

    let mut labels = HashSet::new();
    let mut cleaned = Vec::with_capacity(payload.fields.len());
    for (index, field) in payload.fields.iter().enumerate() {
        let label = field.label.trim();
        if label.is_empty() {
            errors = errors.with_field_error(
                "fields",
                format!("Field {}: label cannot be empty.", index + 1),
            );
        } else if !labels.insert(label.to_lowercase()) {
            errors = errors.with_field_error(
                "fields",
                format!("Field labels must be unique within a form ({label})."),
            );
        }

        let mut field = field.clone();
        if field.field_type == FieldType::Select {
            if field.options.is_empty() {
                errors = errors.with_field_error(
                    "options",
                    "SELECT fields must have at least one option.",
                );
            } else {
                field.options = field
                    .options
                    .iter()
                    .map(|option| option.trim())
                    .filter(|option| !option.is_empty())
                    .map(str::to_string)
                    .collect();
                if field.options.is_empty() {
                    errors = errors
                        .with_field_error("options", "Options cannot be empty or whitespace.");
                }
            }
        } else {
            field.options.clear();
        }
        cleaned.push(field);
    }

    if errors.has_field_errors() {
        warn!(name = %payload.name, "template payload rejected");
        return Err(errors);
    }
    Ok(cleaned)
}

/// Server-side record checks, phrased the way the backend reports them.
fn check_record(template: &Template, data: &RecordData) -> Result<(), ApiErrorPayload> {
    let mut errors = ApiErrorPayload::default();
    for field in template.ordered_fields() {
        let value = data.get(&field.id);
        if validator::validate(field, value).is_none() {
            continue;
        }
        let blank = value.map(FieldValue::is_blank).unwrap_or(true);
        let message = if blank {
            validator::required_message(field)
        } else {
            match field.field_type {
                FieldType::Email => format!("{} must be a valid email", field.label),
                FieldType::Number => format!("{} must be a valid number", field.label),
                FieldType::Date => format!("{} must be a valid date (YYYY-MM-DD)", field.label),
                FieldType::Select => format!(
                    "{} must be one of: {}",
                    field.label,
                    field.options().join(", ")
                ),
                FieldType::Text | FieldType::Textarea | FieldType::Password => {
                    format!("{} is invalid", field.label)
                }
            }
        };
        errors = errors.with_field_error("data", message);
    }
    if errors.has_field_errors() {
        warn!(template = %template.name, "record payload rejected");
        return Err(errors);
    }
    Ok(())
}

fn reject(payload: ApiErrorPayload) -> CoreError {
    CoreError::Rejected(RemoteError::new(payload).with_status(BAD_REQUEST))
}

fn unknown_template_reference(id: u64) -> CoreError {
    reject(ApiErrorPayload::field(
        "form_template",
        format!("Invalid pk \"{id}\" - object does not exist."),
    ))
}

fn template_missing(id: u64) -> CoreError {
    CoreError::TemplateNotFound(format!("Form template #{id} not found"))
}

fn record_missing(id: u64) -> CoreError {
    CoreError::RecordNotFound(format!("Employee #{id} not found"))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
