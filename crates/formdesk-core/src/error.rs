use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use crate::api::ApiErrorPayload;

/// Field id → message, one entry per offending field.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Please fix the errors in the form ({} field(s))", .0.len())]
    FieldErrors(FieldErrors),
    #[error("Field not found: {0}")]
    FieldNotFound(String),
    #[error("{0}")]
    TemplateNotFound(String),
    #[error("{0}")]
    RecordNotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Request rejected: {0}")]
    Rejected(RemoteError),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

impl CoreError {
    /// Builds a rejection carrying a single field-level message.
    pub fn rejected_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Rejected(RemoteError::new(ApiErrorPayload::field(field, message)))
    }

    /// Messages suitable for toast-style display, one per offending field when available.
    pub fn user_messages(&self, fallback: &str) -> Vec<String> {
        match self {
            CoreError::Rejected(remote) => remote.payload.user_messages(fallback),
            CoreError::FieldErrors(errors) => errors.values().cloned().collect(),
            CoreError::Validation(message)
            | CoreError::TemplateNotFound(message)
            | CoreError::RecordNotFound(message) => vec![message.clone()],
            _ => vec![fallback.to_string()],
        }
    }
}

/// Non-2xx response from a persistence collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub payload: ApiErrorPayload,
}

impl RemoteError {
    pub fn new(payload: ApiErrorPayload) -> Self {
        Self {
            status: None,
            payload,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.payload.user_messages("request failed");
        match self.status {
            Some(status) => write!(f, "[{status}] {}", messages.join("; ")),
            None => f.write_str(&messages.join("; ")),
        }
    }
}
