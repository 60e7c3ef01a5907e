//! Non-interactive subcommands and the listing helpers the shell shares.

use std::fs;

use chrono::{DateTime, Utc};
use dialoguer::theme::ColorfulTheme;
use tracing::info;

use formdesk_core::{
    display_data, filter_records, filter_templates, RecordRow, RecordStore, RecordWorkspace,
    TemplateBuilder, TemplateQuery, TemplateStore,
};
use formdesk_domain::{Displayable, Record, Template};

use crate::cli::{io, output, CliContext, RecordsCommand, TemplatesCommand};
use crate::errors::{CliError, CliResult};
use crate::utils::build_info;

pub const TEMPLATE_EXPORTED: &str = "Template exported!";
pub const NO_TEMPLATES: &str = "No form templates yet";
pub const NO_RECORDS: &str = "No employees found";

pub fn templates(context: &CliContext, command: TemplatesCommand) -> CliResult {
    match command {
        TemplatesCommand::List { search } => {
            let templates = context.store.list_templates()?;
            let query = TemplateQuery {
                search,
                ..TemplateQuery::default()
            };
            let matches = filter_templates(&templates, &query);
            if matches.is_empty() {
                io::print_info(NO_TEMPLATES);
                return Ok(());
            }
            print_lines(template_table(&matches));
            Ok(())
        }
        TemplatesCommand::Show { id } => {
            let template = context.store.get_template(id)?;
            print_lines(template_detail(&template));
            Ok(())
        }
        TemplatesCommand::Import { file } => {
            let json = fs::read_to_string(&file)?;
            let mut builder = TemplateBuilder::import_json(&json)?;
            let saved = builder.save(&context.store)?;
            output::notices(builder.take_notices());
            info!(file = %file.display(), template_id = ?saved.id, "template imported");
            io::print_info(format!(
                "#{} {}",
                saved.id.unwrap_or_default(),
                saved.display_label()
            ));
            Ok(())
        }
        TemplatesCommand::Export { id, out } => {
            let template = context.store.get_template(id)?;
            let json = TemplateBuilder::from_template(&template).export_json()?;
            match out {
                Some(path) => {
                    fs::write(&path, json)?;
                    io::print_success(TEMPLATE_EXPORTED);
                    io::print_info(path.display());
                }
                None => output::line(json),
            }
            Ok(())
        }
        TemplatesCommand::Delete { id, yes } => {
            let template = context.store.get_template(id)?;
            let affected = context.store.list_records(Some(id))?.len();
            let prompt = format!(
                "Delete \"{}\" and its {affected} record(s)?",
                template.name
            );
            if !yes && !io::confirm_action(&ColorfulTheme::default(), &prompt, false)? {
                io::print_info("Nothing deleted");
                return Ok(());
            }
            context.store.delete_template(id)?;
            io::print_success(format!("Form template \"{}\" deleted", template.name));
            Ok(())
        }
    }
}

pub fn records(context: &CliContext, command: RecordsCommand) -> CliResult {
    match command {
        RecordsCommand::List(args) => {
            let query = context.record_query(&args)?;
            let templates = context.store.list_templates()?;
            let records = context.store.list_records(None)?;
            let rows = filter_records(&records, &templates, &query);
            if rows.is_empty() {
                io::print_info(NO_RECORDS);
                return Ok(());
            }
            print_lines(record_table(&rows));
            Ok(())
        }
        RecordsCommand::Show { id } => {
            let record = context.store.get_record(id)?;
            let template = context.store.get_template(record.template_id)?;
            print_lines(record_detail(&record, &template));
            Ok(())
        }
        RecordsCommand::Delete { ids, yes } => {
            if ids.is_empty() {
                return Err(CliError::InvalidArguments("no record ids given".into()));
            }
            let mut workspace = RecordWorkspace::load(&context.store)?;
            let prompt = format!("Delete {} record(s)?", ids.len());
            if !yes && !io::confirm_action(&ColorfulTheme::default(), &prompt, false)? {
                io::print_info("Nothing deleted");
                return Ok(());
            }
            let result = match ids.as_slice() {
                [id] => workspace.delete_record(&context.store, *id),
                many => workspace.delete_records(&context.store, many).map(|_| ()),
            };
            // Failure notices repeat the returned error, which main prints.
            let notices = workspace.take_notices();
            result?;
            output::notices(notices);
            Ok(())
        }
    }
}

pub fn info(context: &CliContext) {
    let meta = build_info::current();
    output::section(format!("formdesk {}", meta.version));
    let mut rows = meta.rows();
    rows.push(("Config", context.config_manager.config_path().display().to_string()));
    rows.push(("Store", context.store.path().display().to_string()));
    print_lines(aligned_pairs(&rows));
}

pub fn print_lines(lines: Vec<String>) {
    for line in lines {
        output::line(line);
    }
}

pub fn template_table(templates: &[&Template]) -> Vec<String> {
    let rows = templates
        .iter()
        .map(|template| {
            vec![
                template.id.map(|id| id.to_string()).unwrap_or_default(),
                template.name.clone(),
                template.fields.len().to_string(),
                template.required_count().to_string(),
                template.description.clone().unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table(&["ID", "Name", "Fields", "Required", "Description"], &rows)
}

pub fn template_detail(template: &Template) -> Vec<String> {
    let mut lines = vec![format!(
        "#{} {}",
        template.id.map(|id| id.to_string()).unwrap_or_else(|| "new".into()),
        template.name
    )];
    if let Some(description) = template.description.as_deref().filter(|text| !text.is_empty()) {
        lines.push(description.to_string());
    }
    let rows = template
        .ordered_fields()
        .into_iter()
        .map(|field| {
            vec![
                field.order.to_string(),
                field.label.clone(),
                field.field_type.to_string(),
                if field.required { "yes" } else { "" }.to_string(),
                field.placeholder.clone().unwrap_or_default(),
                field.options().join(", "),
            ]
        })
        .collect::<Vec<_>>();
    lines.extend(table(
        &["#", "Label", "Type", "Required", "Placeholder", "Options"],
        &rows,
    ));
    lines
}

pub fn record_table(rows: &[RecordRow<'_>]) -> Vec<String> {
    let cells = rows
        .iter()
        .map(|row| {
            vec![
                row.record.id.map(|id| id.to_string()).unwrap_or_default(),
                row.display_name.clone(),
                row.template_name.unwrap_or("-").to_string(),
                format_timestamp(row.record.created_at),
            ]
        })
        .collect::<Vec<_>>();
    table(&["ID", "Name", "Template", "Created"], &cells)
}

pub fn record_detail(record: &Record, template: &Template) -> Vec<String> {
    let mut lines = vec![
        formdesk_core::derive_display_name(record, template),
        format!("Template: {}", template.name),
        format!("Created : {}", format_timestamp(record.created_at)),
        format!("Updated : {}", format_timestamp(record.updated_at)),
    ];
    let pairs = display_data(record, template);
    if pairs.is_empty() {
        lines.push("(no values captured)".into());
    } else {
        let rows: Vec<(&str, String)> = pairs
            .iter()
            .map(|(label, value)| (label.as_str(), value.clone()))
            .collect();
        lines.extend(aligned_pairs(&rows));
    }
    lines
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

fn aligned_pairs(rows: &[(&str, String)]) -> Vec<String> {
    let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("  {label:<width$} : {value}"))
        .collect()
}

/// Left-aligned columns separated by two spaces, header underlined.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}
