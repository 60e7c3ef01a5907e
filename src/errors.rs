use std::io;

use formdesk_config::ConfigError;
use formdesk_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the command line and the interactive shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
}

impl CliError {
    /// Lines to print for the user; field-level errors get one line each.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            CliError::Core(err @ (CoreError::Rejected(_) | CoreError::FieldErrors(_))) => {
                err.user_messages(&err.to_string())
            }
            other => vec![other.to_string()],
        }
    }
}

pub type CliResult<T = ()> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_list_each_field() {
        let err = CliError::from(
            CoreError::rejected_field("name", "A form template with this name already exists."),
        );
        assert_eq!(
            err.user_messages(),
            vec!["name: A form template with this name already exists.".to_string()]
        );
    }

    #[test]
    fn other_errors_use_display() {
        let err = CliError::InvalidArguments("unknown sort key".into());
        assert_eq!(err.user_messages(), vec!["unknown sort key".to_string()]);
    }
}
