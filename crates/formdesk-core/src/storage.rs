//! Persistence collaborator contracts.
//!
//! Backends are authoritative: they may reject a payload the client
//! considered valid, reporting `CoreError::Rejected` with an error payload.

use formdesk_domain::{Record, Template};

use crate::{
    api::{RecordCreatePayload, RecordUpdatePayload, TemplatePayload},
    CoreError,
};

/// Abstraction over backends capable of storing templates.
pub trait TemplateStore: Send + Sync {
    fn list_templates(&self) -> Result<Vec<Template>, CoreError>;
    fn get_template(&self, id: u64) -> Result<Template, CoreError>;
    fn create_template(&self, payload: &TemplatePayload) -> Result<Template, CoreError>;
    fn update_template(&self, id: u64, payload: &TemplatePayload) -> Result<Template, CoreError>;
    /// Removes the template together with every record created against it.
    fn delete_template(&self, id: u64) -> Result<(), CoreError>;
}

/// Abstraction over backends capable of storing records.
pub trait RecordStore: Send + Sync {
    fn list_records(&self, template_id: Option<u64>) -> Result<Vec<Record>, CoreError>;
    fn get_record(&self, id: u64) -> Result<Record, CoreError>;
    fn create_record(&self, payload: &RecordCreatePayload) -> Result<Record, CoreError>;
    /// Replaces the stored `data` wholesale.
    fn update_record(&self, id: u64, payload: &RecordUpdatePayload) -> Result<Record, CoreError>;
    fn delete_record(&self, id: u64) -> Result<(), CoreError>;
    /// Deletes every listed record that exists and returns how many were removed.
    fn delete_records(&self, ids: &[u64]) -> Result<usize, CoreError>;
}

/// Payload handed to the submit collaborator; its shape follows the engine mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSubmission {
    Create(RecordCreatePayload),
    Update {
        id: u64,
        payload: RecordUpdatePayload,
    },
}

impl RecordSubmission {
    /// Forwards the submission to the matching store call.
    pub fn apply<S>(self, store: &S) -> Result<Record, CoreError>
    where
        S: RecordStore + ?Sized,
    {
        match self {
            RecordSubmission::Create(payload) => store.create_record(&payload),
            RecordSubmission::Update { id, payload } => store.update_record(id, &payload),
        }
    }
}

/// Caller-supplied collaborator that persists a validated record.
pub trait RecordSubmitter {
    fn submit_record(&mut self, submission: RecordSubmission) -> Result<Record, CoreError>;
}
