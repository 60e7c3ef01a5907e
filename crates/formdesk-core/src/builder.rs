//! Stateful template editor.
//!
//! Holds a working copy of a template, at most one field draft being edited
//! in place, and the edit/preview display mode. Mutations are synchronous;
//! only `save` talks to the persistence collaborator.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use formdesk_domain::{Field, FieldType, RecordData, Template, DEFAULT_SELECT_OPTIONS};

use crate::{
    api::{TemplateExport, TemplatePayload, GENERIC_SAVE_FAILURE},
    notice::{Notice, Notices},
    renderer::{FormRenderer, RenderedControl},
    storage::TemplateStore,
    CoreError,
};

pub const MISSING_NAME: &str = "Please enter a form name";
pub const MISSING_FIELDS: &str = "Please add at least one field";
pub const EMPTY_PREVIEW: &str = "Add some fields to preview the form";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderMode {
    #[default]
    Edit,
    Preview,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    template: Template,
    draft: Option<Field>,
    mode: BuilderMode,
    saving: bool,
    notices: Notices,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing a copy of an existing template.
    pub fn from_template(template: &Template) -> Self {
        Self {
            template: template.clone(),
            ..Self::default()
        }
    }

    /// Parses a document produced by [`TemplateBuilder::export_json`] into a fresh, unsaved template.
    pub fn import_json(json: &str) -> Result<Self, CoreError> {
        let export: TemplateExport = serde_json::from_str(json)?;
        let mut template = export.into_template();
        template.fields.sort_by_key(|field| field.order);
        template.renumber();
        for index in 0..template.fields.len() {
            if template.fields[index].id.trim().is_empty()
                || template.fields[..index]
                    .iter()
                    .any(|other| other.id == template.fields[index].id)
            {
                let id = unique_field_id(&template);
                template.fields[index].id = id;
            }
        }
        info!(name = %template.name, fields = template.fields.len(), "template imported");
        Ok(Self {
            template,
            ..Self::default()
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.template.name = name.into();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.template.description = description.filter(|text| !text.trim().is_empty());
    }

    pub fn field_count(&self) -> usize {
        self.template.fields.len()
    }

    pub fn required_count(&self) -> usize {
        self.template.required_count()
    }

    pub fn mode(&self) -> BuilderMode {
        self.mode
    }

    pub fn is_preview(&self) -> bool {
        self.mode == BuilderMode::Preview
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    /// Appends a field with default settings and returns its generated id.
    pub fn add_field(&mut self, field_type: FieldType) -> String {
        let id = unique_field_id(&self.template);
        let label = format!("New {} field", field_type.as_str().to_lowercase());
        let mut field = Field::new(id.clone(), field_type, label)
            .with_order(self.template.fields.len() as u32)
            .with_placeholder("");
        if field_type.has_options() {
            field = field.with_options(DEFAULT_SELECT_OPTIONS);
        }
        self.template.fields.push(field);
        debug!(field_id = %id, field_type = %field_type, "field added");
        self.notices
            .push(Notice::success(format!("{field_type} field added!")));
        id
    }

    /// Replaces the field with matching id in place, keeping its id.
    pub fn update_field(&mut self, id: &str, updated: Field) -> Result<(), CoreError> {
        let slot = self
            .template
            .field_mut(id)
            .ok_or_else(|| CoreError::FieldNotFound(id.to_string()))?;
        let mut updated = updated;
        updated.id = id.to_string();
        updated.normalize_options();
        *slot = updated;
        debug!(field_id = %id, "field updated");
        Ok(())
    }

    /// Deletes a field. Remaining `order` values are left as they are.
    pub fn remove_field(&mut self, id: &str) -> Result<Field, CoreError> {
        let index = self
            .template
            .position(id)
            .ok_or_else(|| CoreError::FieldNotFound(id.to_string()))?;
        let removed = self.template.fields.remove(index);
        if self.draft.as_ref().is_some_and(|draft| draft.id == id) {
            self.draft = None;
        }
        debug!(field_id = %id, "field removed");
        self.notices.push(Notice::success("Field removed!"));
        Ok(removed)
    }

    /// Moves the field `from_id` to the position held by `to_id` and renumbers every field.
    pub fn reorder(&mut self, from_id: &str, to_id: &str) -> Result<(), CoreError> {
        let from = self
            .template
            .position(from_id)
            .ok_or_else(|| CoreError::FieldNotFound(from_id.to_string()))?;
        let to = self
            .template
            .position(to_id)
            .ok_or_else(|| CoreError::FieldNotFound(to_id.to_string()))?;
        self.move_field(from, to)
    }

    /// Array-move from one index to another, then rewrite `order` to match.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), CoreError> {
        let len = self.template.fields.len();
        if from >= len || to >= len {
            return Err(CoreError::InvalidOperation(format!(
                "cannot move field {from} to {to} in a list of {len}"
            )));
        }
        if from != to {
            let field = self.template.fields.remove(from);
            self.template.fields.insert(to, field);
            self.template.renumber();
            debug!(from, to, "fields reordered");
        }
        Ok(())
    }

    /// Clones a field into the draft slot, replacing any previous draft.
    pub fn begin_edit(&mut self, id: &str) -> Result<&mut Field, CoreError> {
        let field = self
            .template
            .field(id)
            .cloned()
            .ok_or_else(|| CoreError::FieldNotFound(id.to_string()))?;
        Ok(self.draft.insert(field))
    }

    pub fn draft(&self) -> Option<&Field> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Field> {
        self.draft.as_mut()
    }

    pub fn add_option(&mut self) -> Result<(), CoreError> {
        self.draft_options()?.push(String::new());
        Ok(())
    }

    pub fn update_option(&mut self, index: usize, value: impl Into<String>) -> Result<(), CoreError> {
        let options = self.draft_options()?;
        let slot = options
            .get_mut(index)
            .ok_or_else(|| CoreError::InvalidOperation(format!("no option at index {index}")))?;
        *slot = value.into();
        Ok(())
    }

    pub fn remove_option(&mut self, index: usize) -> Result<String, CoreError> {
        let options = self.draft_options()?;
        if index >= options.len() {
            return Err(CoreError::InvalidOperation(format!(
                "no option at index {index}"
            )));
        }
        Ok(options.remove(index))
    }

    /// Applies the draft through [`TemplateBuilder::update_field`].
    pub fn commit_edit(&mut self) -> Result<(), CoreError> {
        let draft = self
            .draft
            .take()
            .ok_or_else(|| CoreError::InvalidOperation("no field is being edited".into()))?;
        let id = draft.id.clone();
        self.update_field(&id, draft)
    }

    pub fn cancel_edit(&mut self) -> Option<Field> {
        self.draft.take()
    }

    fn draft_options(&mut self) -> Result<&mut Vec<String>, CoreError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| CoreError::InvalidOperation("no field is being edited".into()))?;
        if !draft.field_type.has_options() {
            return Err(CoreError::InvalidOperation(format!(
                "{} fields have no options",
                draft.field_type
            )));
        }
        Ok(draft.options.get_or_insert_with(Vec::new))
    }

    /// Switches between edit and preview. Entering preview needs at least one field.
    pub fn toggle_preview(&mut self) -> Result<BuilderMode, CoreError> {
        self.mode = match self.mode {
            BuilderMode::Preview => BuilderMode::Edit,
            BuilderMode::Edit => {
                if self.template.fields.is_empty() {
                    self.notices.push(Notice::error(EMPTY_PREVIEW));
                    return Err(CoreError::Validation(EMPTY_PREVIEW.to_string()));
                }
                BuilderMode::Preview
            }
        };
        Ok(self.mode)
    }

    /// Read-only controls for the working template, sorted by order.
    pub fn preview(&self) -> Vec<RenderedControl> {
        FormRenderer::render_template(&self.template, &RecordData::new())
    }

    /// Pretty JSON of the working template without server-assigned fields.
    pub fn export_json(&self) -> Result<String, CoreError> {
        let export = TemplateExport::from_template(&self.template);
        Ok(serde_json::to_string_pretty(&export)?)
    }

    pub fn export_file_name(&self) -> String {
        let name = self.template.name.trim();
        if name.is_empty() {
            "form-template.json".to_string()
        } else {
            format!("{name}.json")
        }
    }

    /// Validates and cleans the working template, then creates or updates it.
    ///
    /// On rejection the working copy is left untouched and the error is returned
    /// after one notice per message has been queued.
    pub fn save<S>(&mut self, store: &S) -> Result<Template, CoreError>
    where
        S: TemplateStore + ?Sized,
    {
        let prepared = match self.prepare() {
            Ok(prepared) => prepared,
            Err(message) => {
                warn!(reason = %message, "template save aborted");
                self.notices.push(Notice::error(message.clone()));
                return Err(CoreError::Validation(message));
            }
        };

        let payload = TemplatePayload::from_template(&prepared);
        self.saving = true;
        let result = match prepared.id {
            Some(id) => store.update_template(id, &payload),
            None => store.create_template(&payload),
        };
        self.saving = false;

        match result {
            Ok(saved) => {
                info!(id = ?saved.id, name = %saved.name, "template saved");
                self.template = saved.clone();
                self.notices.push(Notice::success("Form saved successfully!"));
                Ok(saved)
            }
            Err(err) => {
                warn!(error = %err, "template save rejected");
                self.notices
                    .extend_errors(err.user_messages(GENERIC_SAVE_FAILURE));
                Err(err)
            }
        }
    }

    fn prepare(&self) -> Result<Template, String> {
        if self.template.name.trim().is_empty() {
            return Err(MISSING_NAME.to_string());
        }
        if self.template.fields.is_empty() {
            return Err(MISSING_FIELDS.to_string());
        }
        let mut prepared = self.template.clone();
        for (index, field) in prepared.fields.iter_mut().enumerate() {
            if field.label.trim().is_empty() {
                return Err(format!("Field {} needs a label", index + 1));
            }
            field.normalize_options();
            if let Some(options) = field.options.as_mut() {
                let cleaned: Vec<String> = options
                    .iter()
                    .map(|option| option.trim())
                    .filter(|option| !option.is_empty())
                    .map(str::to_string)
                    .collect();
                if cleaned.is_empty() {
                    return Err(format!("{} needs at least one option", field.label));
                }
                *options = cleaned;
            }
        }
        prepared.renumber();
        Ok(prepared)
    }
}

/// `field_<millis>_<9 random chars>`, unique within `template`.
fn unique_field_id(template: &Template) -> String {
    loop {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
        let id = format!("field_{}_{}", Utc::now().timestamp_millis(), suffix);
        if template.field(&id).is_none() {
            return id;
        }
    }
}
