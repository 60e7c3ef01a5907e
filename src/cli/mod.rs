//! Command line surface: clap definitions, shared context and dispatch.

pub mod commands;
pub mod forms;
pub mod io;
pub mod output;
pub mod shell;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use formdesk_config::{Config, ConfigManager};
use formdesk_core::{RecordQuery, SortKey, SortOrder};
use formdesk_storage_json::JsonFormStore;

use crate::cli::output::OutputPreferences;
use crate::errors::{CliError, CliResult};

#[derive(Debug, Parser)]
#[command(
    name = "formdesk",
    version,
    about = "Build dynamic form templates and capture records against them"
)]
pub struct Cli {
    /// Directory holding the store and config (default: platform data/config dirs).
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Disable colored output for this run.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage form templates.
    #[command(subcommand)]
    Templates(TemplatesCommand),
    /// Browse and delete records.
    #[command(subcommand)]
    Records(RecordsCommand),
    /// Interactive menus for building templates and filling records.
    Shell,
    /// Show build metadata and resolved paths.
    Info,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List templates, optionally filtered by name or description.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one template's fields.
    Show { id: u64 },
    /// Create a template from an exported JSON document.
    Import { file: PathBuf },
    /// Write a template as a standalone JSON document.
    Export {
        id: u64,
        /// Output file; prints to stdout when omitted.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Delete a template together with its records.
    Delete {
        id: u64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List records, newest first unless told otherwise.
    List(RecordListArgs),
    /// Show one record's captured values.
    Show { id: u64 },
    /// Delete one or more records.
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args, Default)]
pub struct RecordListArgs {
    /// Matches the display name, template name or any field value.
    #[arg(long)]
    pub search: Option<String>,
    /// Only records created from this template.
    #[arg(long = "template", value_name = "ID")]
    pub template_id: Option<u64>,
    /// name, created_at or updated_at (default from config).
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort ascending instead of the configured order.
    #[arg(long)]
    pub asc: bool,
}

/// Config and store shared by every command.
pub struct CliContext {
    pub config_manager: ConfigManager,
    pub config: Config,
    pub store: JsonFormStore,
}

impl CliContext {
    /// With `data_dir`, config and store live side by side under it.
    pub fn open(data_dir: Option<PathBuf>) -> CliResult<Self> {
        let config_manager = match &data_dir {
            Some(dir) => ConfigManager::with_base_dir(dir.clone())?,
            None => ConfigManager::from_env()?,
        };
        let config = config_manager.load()?;
        let data_dir = data_dir.unwrap_or_else(|| config.resolve_data_dir());
        let store = JsonFormStore::new(data_dir)?;
        debug!(store = %store.path().display(), "store opened");
        Ok(Self {
            config_manager,
            config,
            store,
        })
    }

    /// Record query seeded from the configured sort preferences.
    pub fn default_query(&self) -> RecordQuery {
        RecordQuery {
            sort: self.config.default_sort.parse().unwrap_or_default(),
            order: self.config.default_sort_order.parse().unwrap_or_default(),
            ..RecordQuery::default()
        }
    }

    pub fn record_query(&self, args: &RecordListArgs) -> CliResult<RecordQuery> {
        let mut query = self.default_query();
        query.search = args.search.clone();
        query.template_id = args.template_id;
        if let Some(sort) = &args.sort {
            query.sort = sort
                .parse::<SortKey>()
                .map_err(|err| CliError::InvalidArguments(err.to_string()))?;
        }
        if args.asc {
            query.order = SortOrder::Asc;
        }
        Ok(query)
    }

    /// Remembers the template last used for a record; failures are only logged.
    pub fn remember_template(&mut self, template_id: u64) {
        if self.config.last_template_id == Some(template_id) {
            return;
        }
        self.config.last_template_id = Some(template_id);
        if let Err(err) = self.config_manager.save(&self.config) {
            warn!(error = %err, "failed to persist last used template");
        }
    }
}

/// Runs an already-parsed command line.
pub fn run(cli: Cli) -> CliResult {
    let mut context = CliContext::open(cli.data_dir)?;
    crate::init(context.config.log_filter.as_deref());
    output::set_preferences(OutputPreferences {
        color_enabled: context.config.ui_color_enabled && !cli.no_color,
        quiet_mode: false,
    });

    match cli.command {
        Command::Templates(command) => commands::templates(&context, command),
        Command::Records(command) => commands::records(&context, command),
        Command::Shell => shell::run(&mut context),
        Command::Info => {
            commands::info(&context);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn record_list_flags_parse() {
        let cli = Cli::parse_from([
            "formdesk",
            "--data-dir",
            "/tmp/fd",
            "records",
            "list",
            "--search",
            "ali",
            "--template",
            "7",
            "--sort",
            "name",
            "--asc",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fd")));
        let Command::Records(RecordsCommand::List(args)) = cli.command else {
            panic!("expected records list");
        };
        assert_eq!(args.search.as_deref(), Some("ali"));
        assert_eq!(args.template_id, Some(7));
        assert!(args.asc);
    }

    #[test]
    fn record_query_applies_overrides_to_config_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut context = CliContext::open(Some(dir.path().to_path_buf())).expect("open");
        context.config.default_sort = "updated_at".into();

        let query = context
            .record_query(&RecordListArgs::default())
            .expect("default query");
        assert_eq!(query.sort, SortKey::UpdatedAt);
        assert_eq!(query.order, SortOrder::Desc);

        let query = context
            .record_query(&RecordListArgs {
                sort: Some("name".into()),
                asc: true,
                ..RecordListArgs::default()
            })
            .expect("override query");
        assert_eq!(query.sort, SortKey::Name);
        assert_eq!(query.order, SortOrder::Asc);

        let err = context
            .record_query(&RecordListArgs {
                sort: Some("salary".into()),
                ..RecordListArgs::default()
            })
            .expect_err("unknown sort key");
        assert!(err.to_string().contains("salary"));
    }

    #[test]
    fn remember_template_persists_to_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut context = CliContext::open(Some(dir.path().to_path_buf())).expect("open");
        context.remember_template(3);
        let stored = context.config_manager.load().expect("load config");
        assert_eq!(stored.last_template_id, Some(3));
    }
}
