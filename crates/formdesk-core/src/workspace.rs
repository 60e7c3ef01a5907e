//! Page-flow state machine for the record screens.
//!
//! Owns the loaded templates and records, tracks which view is active and
//! refuses transitions whose record or template cannot be resolved. The
//! collections change only after a collaborator call succeeded.

use tracing::{info, warn};

use formdesk_domain::{Identifiable, Record, Template};

use crate::{
    engine::RecordEngine,
    notice::{Notice, Notices},
    search::{filter_records, RecordQuery, RecordRow},
    storage::{RecordStore, TemplateStore},
    CoreError,
};

pub const TEMPLATE_MISSING: &str = "Template not found for this employee";
pub const NO_TEMPLATE_SELECTED: &str = "No template selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceView {
    #[default]
    List,
    Create {
        template_id: u64,
    },
    Edit {
        record_id: u64,
    },
    View {
        record_id: u64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordWorkspace {
    templates: Vec<Template>,
    records: Vec<Record>,
    view: WorkspaceView,
    notices: Notices,
}

impl RecordWorkspace {
    pub fn new(templates: Vec<Template>, records: Vec<Record>) -> Self {
        Self {
            templates,
            records,
            ..Self::default()
        }
    }

    /// Fetches every template and record from `store`.
    pub fn load<S>(store: &S) -> Result<Self, CoreError>
    where
        S: TemplateStore + RecordStore + ?Sized,
    {
        let templates = store.list_templates()?;
        let records = store.list_records(None)?;
        info!(
            templates = templates.len(),
            records = records.len(),
            "workspace loaded"
        );
        Ok(Self::new(templates, records))
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn view(&self) -> WorkspaceView {
        self.view
    }

    pub fn template(&self, id: u64) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == Some(id))
    }

    pub fn record(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|record| record.id == Some(id))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn rows(&self, query: &RecordQuery) -> Vec<RecordRow<'_>> {
        filter_records(&self.records, &self.templates, query)
    }

    pub fn open_create(&mut self, template_id: u64) -> Result<(), CoreError> {
        if self.template(template_id).is_none() {
            return Err(self.refuse(CoreError::TemplateNotFound(
                NO_TEMPLATE_SELECTED.to_string(),
            )));
        }
        self.view = WorkspaceView::Create { template_id };
        Ok(())
    }

    pub fn open_edit(&mut self, record_id: u64) -> Result<(), CoreError> {
        self.resolve(record_id)?;
        self.view = WorkspaceView::Edit { record_id };
        Ok(())
    }

    pub fn open_view(&mut self, record_id: u64) -> Result<(), CoreError> {
        self.resolve(record_id)?;
        self.view = WorkspaceView::View { record_id };
        Ok(())
    }

    pub fn back_to_list(&mut self) {
        self.view = WorkspaceView::List;
    }

    /// Engine bound to the active view. The list view has none.
    pub fn engine(&self) -> Result<RecordEngine<'_>, CoreError> {
        match self.view {
            WorkspaceView::List => Err(CoreError::InvalidOperation(
                "no record form is open".into(),
            )),
            WorkspaceView::Create { template_id } => {
                let template = self.template(template_id).ok_or_else(|| {
                    CoreError::TemplateNotFound(NO_TEMPLATE_SELECTED.to_string())
                })?;
                RecordEngine::create(template)
            }
            WorkspaceView::Edit { record_id } => {
                let (record, template) = self.lookup(record_id)?;
                RecordEngine::edit(template, record)
            }
            WorkspaceView::View { record_id } => {
                let (record, template) = self.lookup(record_id)?;
                RecordEngine::view(template, record)
            }
        }
    }

    /// Inserts or replaces a persisted record and returns to the list.
    pub fn record_saved(&mut self, record: Record) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.is_persisted() && existing.id == record.id)
        {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
        self.view = WorkspaceView::List;
    }

    pub fn record_deleted(&mut self, record_id: u64) {
        self.records.retain(|record| record.id != Some(record_id));
        self.view = WorkspaceView::List;
    }

    /// Deletes through `store`; the local list changes only on success.
    pub fn delete_record<S>(&mut self, store: &S, record_id: u64) -> Result<(), CoreError>
    where
        S: RecordStore + ?Sized,
    {
        match store.delete_record(record_id) {
            Ok(()) => {
                info!(record_id, "record deleted");
                self.record_deleted(record_id);
                self.notices
                    .push(Notice::success("Employee deleted successfully"));
                Ok(())
            }
            Err(err) => {
                warn!(record_id, error = %err, "record delete failed");
                self.notices
                    .extend_errors(err.user_messages("Failed to delete employee"));
                Err(err)
            }
        }
    }

    /// Bulk delete; returns how many records the store removed.
    pub fn delete_records<S>(&mut self, store: &S, ids: &[u64]) -> Result<usize, CoreError>
    where
        S: RecordStore + ?Sized,
    {
        let removed = match store.delete_records(ids) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(error = %err, "bulk record delete failed");
                self.notices
                    .extend_errors(err.user_messages("Failed to delete employees"));
                return Err(err);
            }
        };
        self.records
            .retain(|record| record.id.map_or(true, |id| !ids.contains(&id)));
        self.view = WorkspaceView::List;
        info!(removed, "records deleted");
        let notice = if removed == 0 {
            Notice::info("No employees matched the selection")
        } else {
            Notice::success(format!("{removed} employee(s) deleted"))
        };
        self.notices.push(notice);
        Ok(removed)
    }

    /// Replaces or appends a saved template.
    pub fn template_saved(&mut self, template: Template) {
        match self
            .templates
            .iter_mut()
            .find(|existing| existing.is_persisted() && existing.id == template.id)
        {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Drops a template and the records created against it.
    pub fn template_deleted(&mut self, template_id: u64) {
        self.templates
            .retain(|template| template.id != Some(template_id));
        self.records
            .retain(|record| record.template_id != template_id);
        self.view = WorkspaceView::List;
    }

    fn lookup(&self, record_id: u64) -> Result<(&Record, &Template), CoreError> {
        let record = self
            .record(record_id)
            .ok_or_else(|| CoreError::RecordNotFound(format!("Employee #{record_id} not found")))?;
        let template = self
            .template(record.template_id)
            .ok_or_else(|| CoreError::TemplateNotFound(TEMPLATE_MISSING.to_string()))?;
        Ok((record, template))
    }

    fn resolve(&mut self, record_id: u64) -> Result<(), CoreError> {
        let resolved = self.lookup(record_id).map(|_| ());
        resolved.map_err(|err| self.refuse(err))
    }

    fn refuse(&mut self, err: CoreError) -> CoreError {
        warn!(error = %err, "view transition refused");
        self.notices.push(Notice::error(err.to_string()));
        err
    }
}
