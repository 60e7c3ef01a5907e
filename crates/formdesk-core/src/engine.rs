//! Binds a template to a working data mapping and drives record submission.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use formdesk_domain::{is_blank_entry, Field, FieldValue, Record, RecordData, Template};

use crate::{
    api::{RecordCreatePayload, RecordUpdatePayload},
    notice::{Notice, Notices},
    renderer::{FormRenderer, RenderContext, RenderedControl},
    storage::{RecordSubmission, RecordSubmitter},
    validator::{validate, validate_template},
    CoreError, FieldErrors,
};

pub const FIX_ERRORS: &str = "Please fix the errors in the form";

/// Which kind of session the engine was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Create,
    Edit { record_id: u64 },
    View { record_id: u64 },
}

impl EngineMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, EngineMode::View { .. })
    }
}

/// Editing session over one record. The template is immutable context for
/// the lifetime of the session.
#[derive(Debug)]
pub struct RecordEngine<'a> {
    template: &'a Template,
    mode: EngineMode,
    data: RecordData,
    errors: FieldErrors,
    touched: BTreeSet<String>,
    submitting: bool,
    notices: Notices,
}

impl<'a> RecordEngine<'a> {
    /// Opens an empty session for a new record. The template must already be saved.
    pub fn create(template: &'a Template) -> Result<Self, CoreError> {
        template_id(template)?;
        Ok(Self::open(template, EngineMode::Create, RecordData::new()))
    }

    pub fn edit(template: &'a Template, record: &Record) -> Result<Self, CoreError> {
        let record_id = bind(template, record)?;
        Ok(Self::open(
            template,
            EngineMode::Edit { record_id },
            record.data.clone(),
        ))
    }

    pub fn view(template: &'a Template, record: &Record) -> Result<Self, CoreError> {
        let record_id = bind(template, record)?;
        Ok(Self::open(
            template,
            EngineMode::View { record_id },
            record.data.clone(),
        ))
    }

    fn open(template: &'a Template, mode: EngineMode, data: RecordData) -> Self {
        debug!(template = %template.name, ?mode, "record engine opened");
        Self {
            template,
            mode,
            data,
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            submitting: false,
            notices: Notices::default(),
        }
    }

    pub fn template(&self) -> &'a Template {
        self.template
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.data.get(field_id)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_touched(&self, field_id: &str) -> bool {
        self.touched.contains(field_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    /// Stores a value and clears the field's error; validation waits for `touch` or `submit`.
    pub fn set_value(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), CoreError> {
        self.ensure_writable()?;
        self.field(field_id)?;
        self.data.insert(field_id.to_string(), value.into());
        self.errors.remove(field_id);
        Ok(())
    }

    /// Like [`RecordEngine::set_value`], decoding raw input by the field's type.
    pub fn set_input(&mut self, field_id: &str, raw: &str) -> Result<(), CoreError> {
        let value = self.field(field_id)?.decode(raw);
        self.set_value(field_id, value)
    }

    /// Marks a field as interacted-with and validates it. Returns the stored error.
    pub fn touch(&mut self, field_id: &str) -> Result<Option<&str>, CoreError> {
        let field = self.field(field_id)?;
        self.touched.insert(field_id.to_string());
        match validate(field, self.data.get(field_id)) {
            Some(message) => {
                self.errors.insert(field_id.to_string(), message);
            }
            None => {
                self.errors.remove(field_id);
            }
        }
        Ok(self.errors.get(field_id).map(String::as_str))
    }

    /// The error to show next to a field; pristine fields never show one.
    pub fn visible_error(&self, field_id: &str) -> Option<&str> {
        if !self.is_touched(field_id) {
            return None;
        }
        self.errors.get(field_id).map(String::as_str)
    }

    /// Validates everything and, when clean, hands the payload to `submitter`.
    pub fn submit<S>(&mut self, submitter: &mut S) -> Result<Record, CoreError>
    where
        S: RecordSubmitter + ?Sized,
    {
        self.ensure_writable()?;
        if self.submitting {
            return Err(CoreError::InvalidOperation(
                "a submission is already in progress".into(),
            ));
        }

        self.touched
            .extend(self.template.fields.iter().map(|field| field.id.clone()));
        self.errors = validate_template(self.template, &self.data);
        if !self.errors.is_empty() {
            warn!(
                template = %self.template.name,
                errors = self.errors.len(),
                "record submission aborted by validation"
            );
            self.notices.push(Notice::error(FIX_ERRORS));
            return Err(CoreError::FieldErrors(self.errors.clone()));
        }

        let (submission, success, failure) = match self.mode {
            EngineMode::Create => (
                RecordSubmission::Create(RecordCreatePayload {
                    form_template: template_id(self.template)?,
                    data: self.data.clone(),
                }),
                "Employee created successfully",
                "Failed to create employee",
            ),
            EngineMode::Edit { record_id } => (
                RecordSubmission::Update {
                    id: record_id,
                    payload: RecordUpdatePayload {
                        data: self.data.clone(),
                    },
                },
                "Employee updated successfully",
                "Failed to update employee",
            ),
            EngineMode::View { .. } => return Err(read_only()),
        };

        self.submitting = true;
        let result = submitter.submit_record(submission);
        self.submitting = false;

        match result {
            Ok(record) => {
                info!(record_id = ?record.id, template = %self.template.name, "record submitted");
                self.notices.push(Notice::success(success));
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "record submission rejected");
                self.notices.extend_errors(err.user_messages(failure));
                Err(err)
            }
        }
    }

    /// Fields whose current value is present and non-blank.
    pub fn completed_field_count(&self) -> usize {
        self.template
            .fields
            .iter()
            .filter(|field| !is_blank_entry(&self.data, &field.id))
            .count()
    }

    pub fn completed_required_count(&self) -> usize {
        self.template
            .fields
            .iter()
            .filter(|field| field.required && !is_blank_entry(&self.data, &field.id))
            .count()
    }

    pub fn total_required_count(&self) -> usize {
        self.template.required_count()
    }

    /// Share of required fields completed, 0–100. A template without required fields is 100.
    pub fn progress_percent(&self) -> u8 {
        let total = self.total_required_count();
        if total == 0 {
            return 100;
        }
        ((self.completed_required_count() * 100) / total) as u8
    }

    /// Controls for every field in display order, carrying values and visible errors.
    pub fn controls(&self) -> Vec<RenderedControl> {
        let disabled = self.mode.is_read_only() || self.submitting;
        self.template
            .ordered_fields()
            .into_iter()
            .map(|field| {
                FormRenderer::render(
                    field,
                    RenderContext {
                        value: self.data.get(&field.id),
                        error: self.visible_error(&field.id),
                        disabled,
                    },
                )
            })
            .collect()
    }

    fn field(&self, field_id: &str) -> Result<&'a Field, CoreError> {
        self.template
            .field(field_id)
            .ok_or_else(|| CoreError::FieldNotFound(field_id.to_string()))
    }

    fn ensure_writable(&self) -> Result<(), CoreError> {
        if self.mode.is_read_only() {
            return Err(read_only());
        }
        Ok(())
    }
}

fn read_only() -> CoreError {
    CoreError::InvalidOperation("records opened for viewing cannot be changed".into())
}

fn template_id(template: &Template) -> Result<u64, CoreError> {
    template.id.ok_or_else(|| {
        CoreError::InvalidOperation("the template must be saved before it can hold records".into())
    })
}

fn bind(template: &Template, record: &Record) -> Result<u64, CoreError> {
    let record_id = record
        .id
        .ok_or_else(|| CoreError::InvalidOperation("the record has not been saved yet".into()))?;
    if template_id(template)? != record.template_id {
        return Err(CoreError::TemplateNotFound(
            crate::workspace::TEMPLATE_MISSING.to_string(),
        ));
    }
    Ok(record_id)
}
