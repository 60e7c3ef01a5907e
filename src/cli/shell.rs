//! Interactive dialoguer menus.
//!
//! The shell only collects input and prints; every state change goes through
//! `TemplateBuilder`, `RecordWorkspace` and `RecordEngine`, whose queued
//! notices are printed after each action.

use std::fs;

use dialoguer::{theme::ColorfulTheme, MultiSelect};
use tracing::info;

use formdesk_core::{
    filter_templates, ControlKind, RecordQuery, RecordWorkspace, RenderedControl, SortKey,
    SortOrder, TemplateBuilder, TemplateQuery, TemplateStore,
};
use formdesk_domain::{Displayable, FieldType, Template};

use crate::cli::commands::{self, TEMPLATE_EXPORTED};
use crate::cli::forms::{DialoguerInteraction, FormResult, RecordForm};
use crate::cli::{io, output, CliContext};
use crate::errors::{CliError, CliResult};

pub fn run(context: &mut CliContext) -> CliResult {
    let theme = ColorfulTheme::default();
    output::section("formdesk");
    loop {
        let items = ["Employee records", "Form templates", "Exit"];
        match io::select_index(&theme, "Main menu", &items, 0)? {
            Some(0) => records_menu(context, &theme)?,
            Some(1) => templates_menu(context, &theme)?,
            _ => return Ok(()),
        }
    }
}

/// Prints a failed step and keeps the shell alive; terminal errors still end it.
fn recover(result: CliResult) -> CliResult {
    match result {
        Ok(()) => Ok(()),
        Err(err @ CliError::Dialoguer(_)) => Err(err),
        Err(err) => {
            for message in err.user_messages() {
                io::print_error(message);
            }
            Ok(())
        }
    }
}

// Records

fn records_menu(context: &mut CliContext, theme: &ColorfulTheme) -> CliResult {
    let mut workspace = RecordWorkspace::load(&context.store)?;
    let mut query = context.default_query();
    loop {
        let rows = workspace.rows(&query);
        output::section(format!("Employees ({})", rows.len()));
        if rows.is_empty() {
            io::print_info(commands::NO_RECORDS);
        } else {
            commands::print_lines(commands::record_table(&rows));
        }
        let (ids, labels): (Vec<u64>, Vec<String>) = rows
            .iter()
            .filter_map(|row| {
                let id = row.record.id?;
                let label = format!(
                    "#{id} {} ({})",
                    row.display_name,
                    row.template_name.unwrap_or("-")
                );
                Some((id, label))
            })
            .unzip();
        drop(rows);

        let items = [
            "New record",
            "Open record",
            "Search",
            "Filter by template",
            "Sort",
            "Delete several",
            "Back",
        ];
        let Some(choice) = io::select_index(theme, "Records", &items, 0)? else {
            return Ok(());
        };
        match choice {
            0 => new_record(context, &mut workspace, theme)?,
            1 => {
                if let Some(index) = io::select_index(theme, "Record", &labels, 0)? {
                    record_actions(context, &mut workspace, theme, ids[index])?;
                }
            }
            2 => {
                let current = query.search.clone().unwrap_or_default();
                let search = io::prompt_text(theme, "Search (empty clears)", &current)?;
                query.search = Some(search).filter(|text| !text.trim().is_empty());
            }
            3 => query.template_id = pick_template_filter(&workspace, theme)?,
            4 => pick_sort(&mut query, theme)?,
            5 => delete_several(context, &mut workspace, theme, &ids, &labels)?,
            _ => return Ok(()),
        }
    }
}

fn new_record(
    context: &mut CliContext,
    workspace: &mut RecordWorkspace,
    theme: &ColorfulTheme,
) -> CliResult {
    let templates = workspace.templates();
    if templates.is_empty() {
        io::print_warning(commands::NO_TEMPLATES);
        return Ok(());
    }
    let names: Vec<String> = templates.iter().map(|template| template.display_label()).collect();
    let last = context
        .config
        .last_template_id
        .and_then(|id| templates.iter().position(|template| template.id == Some(id)))
        .unwrap_or(0);
    let Some(index) = io::select_index(theme, "Template", &names, last)? else {
        return Ok(());
    };
    let Some(template_id) = templates[index].id else {
        return Ok(());
    };
    if workspace.open_create(template_id).is_err() {
        output::notices(workspace.take_notices());
        return Ok(());
    }
    fill_form(context, workspace, theme)
}

fn record_actions(
    context: &mut CliContext,
    workspace: &mut RecordWorkspace,
    theme: &ColorfulTheme,
    record_id: u64,
) -> CliResult {
    let items = ["View", "Edit", "Delete", "Back"];
    match io::select_index(theme, &format!("Employee #{record_id}"), &items, 0)? {
        Some(0) => {
            if workspace.open_view(record_id).is_err() {
                output::notices(workspace.take_notices());
                return Ok(());
            }
            show_record(workspace)?;
            workspace.back_to_list();
            Ok(())
        }
        Some(1) => {
            if workspace.open_edit(record_id).is_err() {
                output::notices(workspace.take_notices());
                return Ok(());
            }
            fill_form(context, workspace, theme)
        }
        Some(2) => {
            if io::confirm_action(theme, "Delete this employee?", false)? {
                // The error is already described by the queued notices.
                let _ = workspace.delete_record(&context.store, record_id);
                output::notices(workspace.take_notices());
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn show_record(workspace: &RecordWorkspace) -> CliResult {
    let engine = workspace.engine()?;
    output::section(engine.template().name.as_str());
    let controls = engine.controls();
    let width = controls
        .iter()
        .map(|control| control.label.chars().count())
        .max()
        .unwrap_or(0);
    for control in &controls {
        let value = if control.value.is_empty() { "-" } else { control.value.as_str() };
        output::line(format!("  {:<width$} : {value}", control.label));
    }
    output::line(format!(
        "  Completed {}/{} required fields",
        engine.completed_required_count(),
        engine.total_required_count()
    ));
    Ok(())
}

/// Runs the record form for the workspace's create or edit view.
fn fill_form(
    context: &mut CliContext,
    workspace: &mut RecordWorkspace,
    theme: &ColorfulTheme,
) -> CliResult {
    let outcome = {
        let mut engine = workspace.engine()?;
        let mut interaction = DialoguerInteraction::default();
        output::section(format!("{} ({}% complete)", engine.template().name, engine.progress_percent()));
        loop {
            let result = RecordForm::new(&mut engine).run(&mut interaction, &mut context.store);
            output::notices(engine.take_notices());
            match result {
                Err(CliError::Core(_)) => {
                    if !io::confirm_action(theme, "Review the form and try again?", true)? {
                        break FormResult::Cancelled;
                    }
                }
                Err(err) => return Err(err),
                Ok(outcome) => break outcome,
            }
        }
    };

    match outcome {
        FormResult::Completed(record) => {
            let template_id = record.template_id;
            workspace.record_saved(record);
            context.remember_template(template_id);
        }
        FormResult::Cancelled => {
            io::print_info("No changes saved");
            workspace.back_to_list();
        }
    }
    Ok(())
}

fn pick_template_filter(workspace: &RecordWorkspace, theme: &ColorfulTheme) -> CliResult<Option<u64>> {
    let mut labels = vec!["All templates".to_string()];
    labels.extend(workspace.templates().iter().map(|template| template.name.clone()));
    Ok(match io::select_index(theme, "Show records from", &labels, 0)? {
        Some(index) if index > 0 => workspace
            .templates()
            .get(index - 1)
            .and_then(|template| template.id),
        _ => None,
    })
}

fn pick_sort(query: &mut RecordQuery, theme: &ColorfulTheme) -> CliResult {
    let keys = [SortKey::CreatedAt, SortKey::UpdatedAt, SortKey::Name];
    let current = keys.iter().position(|key| *key == query.sort).unwrap_or(0);
    if let Some(index) = io::select_index(theme, "Sort by", &keys, current)? {
        query.sort = keys[index];
    }
    let orders = [SortOrder::Desc, SortOrder::Asc];
    let labels = ["Descending", "Ascending"];
    let current = orders.iter().position(|order| *order == query.order).unwrap_or(0);
    if let Some(index) = io::select_index(theme, "Order", &labels, current)? {
        query.order = orders[index];
    }
    Ok(())
}

fn delete_several(
    context: &CliContext,
    workspace: &mut RecordWorkspace,
    theme: &ColorfulTheme,
    ids: &[u64],
    labels: &[String],
) -> CliResult {
    if labels.is_empty() {
        return Ok(());
    }
    let Some(picked) = MultiSelect::with_theme(theme)
        .with_prompt("Select employees to delete (space toggles)")
        .items(labels)
        .interact_opt()?
    else {
        return Ok(());
    };
    let selected: Vec<u64> = picked.into_iter().filter_map(|index| ids.get(index).copied()).collect();
    if selected.is_empty() {
        return Ok(());
    }
    let prompt = format!("Delete {} employee(s)?", selected.len());
    if io::confirm_action(theme, &prompt, false)? {
        let _ = workspace.delete_records(&context.store, &selected);
        output::notices(workspace.take_notices());
    }
    Ok(())
}

// Templates

fn templates_menu(context: &mut CliContext, theme: &ColorfulTheme) -> CliResult {
    loop {
        let templates = context.store.list_templates()?;
        let listed = filter_templates(&templates, &TemplateQuery::default());
        output::section(format!("Form templates ({})", listed.len()));
        if listed.is_empty() {
            io::print_info(commands::NO_TEMPLATES);
        } else {
            commands::print_lines(commands::template_table(&listed));
        }

        let items = [
            "New template",
            "Edit template",
            "Import from file",
            "Export to file",
            "Delete template",
            "Back",
        ];
        let Some(choice) = io::select_index(theme, "Templates", &items, 0)? else {
            return Ok(());
        };
        match choice {
            0 => build_template(context, theme, TemplateBuilder::new())?,
            1 => {
                if let Some(template) = pick_template(&listed, theme, "Edit")? {
                    build_template(context, theme, TemplateBuilder::from_template(template))?;
                }
            }
            2 => {
                let path = io::prompt_text(theme, "File to import", "")?;
                let loaded = fs::read_to_string(path.trim())
                    .map_err(CliError::from)
                    .and_then(|json| TemplateBuilder::import_json(&json).map_err(CliError::from));
                match loaded {
                    Ok(builder) => build_template(context, theme, builder)?,
                    Err(err) => recover(Err(err))?,
                }
            }
            3 => {
                if let Some(template) = pick_template(&listed, theme, "Export")? {
                    recover(export_template(template, theme))?;
                }
            }
            4 => {
                if let Some(template) = pick_template(&listed, theme, "Delete")? {
                    let prompt = format!("Delete \"{}\" and all of its records?", template.name);
                    if io::confirm_action(theme, &prompt, false)? {
                        let id = template.id.unwrap_or_default();
                        recover(context.store.delete_template(id).map_err(CliError::from).map(|()| {
                            io::print_success(format!("Form template \"{}\" deleted", template.name));
                        }))?;
                    }
                }
            }
            _ => return Ok(()),
        }
    }
}

fn pick_template<'t>(
    templates: &[&'t Template],
    theme: &ColorfulTheme,
    action: &str,
) -> CliResult<Option<&'t Template>> {
    let names: Vec<String> = templates.iter().map(|template| template.display_label()).collect();
    let picked = io::select_index(theme, &format!("{action} which template?"), &names, 0)?;
    Ok(picked.and_then(|index| templates.get(index).copied()))
}

fn export_template(template: &Template, theme: &ColorfulTheme) -> CliResult {
    let builder = TemplateBuilder::from_template(template);
    let json = builder.export_json()?;
    let path = io::prompt_text(theme, "Write to", &builder.export_file_name())?;
    fs::write(path.trim(), json)?;
    io::print_success(TEMPLATE_EXPORTED);
    Ok(())
}

/// Edit loop for one working template; returns after a save or when closed.
fn build_template(context: &mut CliContext, theme: &ColorfulTheme, mut builder: TemplateBuilder) -> CliResult {
    loop {
        print_builder(&builder);
        let items = [
            "Rename",
            "Edit description",
            "Add field",
            "Edit field",
            "Move field",
            "Remove field",
            "Preview",
            "Export to file",
            "Save",
            "Close",
        ];
        let Some(choice) = io::select_index(theme, "Builder", &items, 2)? else {
            return Ok(());
        };
        let result = match choice {
            0 => io::prompt_text(theme, "Form name", &builder.template().name)
                .map(|name| builder.set_name(name)),
            1 => {
                let current = builder.template().description.clone().unwrap_or_default();
                io::prompt_text(theme, "Description", &current).map(|text| {
                    builder.set_description(Some(text).filter(|text| !text.trim().is_empty()))
                })
            }
            2 => add_field(&mut builder, theme),
            3 => match pick_field(&builder, theme, "Edit")? {
                Some(id) => edit_field(&mut builder, theme, &id),
                None => Ok(()),
            },
            4 => move_field(&mut builder, theme),
            5 => match pick_field(&builder, theme, "Remove")? {
                Some(id) => builder.remove_field(&id).map(|_| ()).map_err(CliError::from),
                None => Ok(()),
            },
            6 => preview(&mut builder, theme),
            7 => export_template(builder.template(), theme),
            8 => match builder.save(&context.store) {
                Ok(saved) => {
                    output::notices(builder.take_notices());
                    info!(template_id = ?saved.id, "template saved from shell");
                    return Ok(());
                }
                Err(_) => Ok(()),
            },
            _ => {
                if io::confirm_action(theme, "Close the builder? Unsaved changes are lost", true)? {
                    return Ok(());
                }
                Ok(())
            }
        };
        // Builder failures already queued notices; print those instead.
        let notices = builder.take_notices();
        if notices.is_empty() {
            recover(result)?;
        } else {
            if let Err(err @ CliError::Dialoguer(_)) = result {
                return Err(err);
            }
            output::notices(notices);
        }
    }
}

fn print_builder(builder: &TemplateBuilder) {
    let template = builder.template();
    let name = if template.name.trim().is_empty() { "(untitled form)" } else { template.name.as_str() };
    output::section(name);
    if let Some(description) = template.description.as_deref() {
        output::line(description);
    }
    output::line(format!(
        "Fields: {}  Required: {}",
        builder.field_count(),
        builder.required_count()
    ));
    for (position, field) in template.fields.iter().enumerate() {
        let marker = if field.required { " *" } else { "" };
        output::line(format!("  {}. [{}] {}{marker}", position + 1, field.field_type, field.label));
    }
}

fn field_labels(builder: &TemplateBuilder) -> Vec<String> {
    builder
        .template()
        .fields
        .iter()
        .enumerate()
        .map(|(position, field)| format!("{}. {}", position + 1, field.label))
        .collect()
}

fn pick_field(builder: &TemplateBuilder, theme: &ColorfulTheme, action: &str) -> CliResult<Option<String>> {
    let labels = field_labels(builder);
    let picked = io::select_index(theme, &format!("{action} which field?"), &labels, 0)?;
    Ok(picked.and_then(|index| builder.template().fields.get(index).map(|field| field.id.clone())))
}

fn pick_type(theme: &ColorfulTheme, current: FieldType) -> CliResult<Option<FieldType>> {
    let labels: Vec<&str> = FieldType::ALL.iter().map(|field_type| field_type.label()).collect();
    let default = FieldType::ALL.iter().position(|field_type| *field_type == current).unwrap_or(0);
    Ok(io::select_index(theme, "Field type", &labels, default)?.map(|index| FieldType::ALL[index]))
}

fn add_field(builder: &mut TemplateBuilder, theme: &ColorfulTheme) -> CliResult {
    let Some(field_type) = pick_type(theme, FieldType::Text)? else {
        return Ok(());
    };
    let id = builder.add_field(field_type);
    output::notices(builder.take_notices());
    if io::confirm_action(theme, "Edit the new field now?", true)? {
        edit_field(builder, theme, &id)?;
    }
    Ok(())
}

fn edit_field(builder: &mut TemplateBuilder, theme: &ColorfulTheme, id: &str) -> CliResult {
    builder.begin_edit(id)?;
    loop {
        let Some(draft) = builder.draft() else {
            return Ok(());
        };
        let mut items = vec![
            format!("Label: {}", draft.label),
            format!("Type: {}", draft.field_type.label()),
            format!("Placeholder: {}", draft.placeholder.as_deref().unwrap_or("")),
            format!("Required: {}", if draft.required { "yes" } else { "no" }),
        ];
        let has_options = draft.field_type.has_options();
        if has_options {
            items.push(format!("Options: {}", draft.options().join(", ")));
        }
        items.push("Apply".into());
        items.push("Cancel".into());
        let (label, field_type, placeholder) = (
            draft.label.clone(),
            draft.field_type,
            draft.placeholder.clone().unwrap_or_default(),
        );

        let Some(choice) = io::select_index(theme, "Edit field", &items, 0)? else {
            builder.cancel_edit();
            return Ok(());
        };
        let action = if has_options || choice < 4 { choice } else { choice + 1 };
        match action {
            0 => {
                let label = io::prompt_text(theme, "Label", &label)?;
                if let Some(draft) = builder.draft_mut() {
                    draft.label = label;
                }
            }
            1 => {
                if let Some(next) = pick_type(theme, field_type)? {
                    if let Some(draft) = builder.draft_mut() {
                        draft.set_type(next);
                    }
                }
            }
            2 => {
                let placeholder = io::prompt_text(theme, "Placeholder", &placeholder)?;
                if let Some(draft) = builder.draft_mut() {
                    draft.placeholder = Some(placeholder);
                }
            }
            3 => {
                if let Some(draft) = builder.draft_mut() {
                    draft.required = !draft.required;
                }
            }
            4 => edit_options(builder, theme)?,
            5 => {
                builder.commit_edit()?;
                return Ok(());
            }
            _ => {
                builder.cancel_edit();
                return Ok(());
            }
        }
    }
}

fn edit_options(builder: &mut TemplateBuilder, theme: &ColorfulTheme) -> CliResult {
    loop {
        let options: Vec<String> = builder
            .draft()
            .map(|draft| draft.options().to_vec())
            .unwrap_or_default();
        for (index, option) in options.iter().enumerate() {
            output::line(format!("  {}. {option}", index + 1));
        }
        let items = ["Add option", "Edit option", "Remove option", "Done"];
        match io::select_index(theme, "Options", &items, 0)? {
            Some(0) => {
                builder.add_option()?;
                let value = io::prompt_text(theme, "New option", "")?;
                builder.update_option(options.len(), value)?;
            }
            Some(1) => {
                if let Some(index) = io::select_index(theme, "Option", &options, 0)? {
                    let value = io::prompt_text(theme, "Option", &options[index])?;
                    builder.update_option(index, value)?;
                }
            }
            Some(2) => {
                if let Some(index) = io::select_index(theme, "Remove which option?", &options, 0)? {
                    builder.remove_option(index)?;
                }
            }
            _ => return Ok(()),
        }
    }
}

fn move_field(builder: &mut TemplateBuilder, theme: &ColorfulTheme) -> CliResult {
    let labels = field_labels(builder);
    let Some(from) = io::select_index(theme, "Move which field?", &labels, 0)? else {
        return Ok(());
    };
    let Some(to) = io::select_index(theme, "Move to position", &labels, from)? else {
        return Ok(());
    };
    builder.move_field(from, to)?;
    Ok(())
}

fn preview(builder: &mut TemplateBuilder, theme: &ColorfulTheme) -> CliResult {
    builder.toggle_preview()?;
    output::section(format!("Preview: {}", builder.template().name));
    for control in builder.preview() {
        for line in control_lines(&control) {
            output::line(line);
        }
    }
    io::select_index(theme, "Preview", &["Back to editing"], 0)?;
    builder.toggle_preview()?;
    Ok(())
}

/// Text rendering of one disabled control.
fn control_lines(control: &RenderedControl) -> Vec<String> {
    let mut lines = vec![format!("  {}", control.display_label())];
    match &control.kind {
        ControlKind::Input(kind) => {
            lines.push(format!("    [{}: {}]", kind.as_str(), control.placeholder));
        }
        ControlKind::TextArea { rows } => {
            lines.push(format!("    [textarea x{rows}: {}]", control.placeholder));
        }
        ControlKind::Choice { options } => {
            for option in options {
                lines.push(format!("    ( ) {}", option.label));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdesk_core::FormRenderer;
    use formdesk_domain::Field;

    #[test]
    fn choice_controls_list_every_option() {
        let field = Field::new("d", FieldType::Select, "Dept")
            .with_required()
            .with_options(["Eng", ""]);
        let lines = control_lines(&FormRenderer::render_preview(&field, None));
        assert_eq!(
            lines,
            vec![
                "  Dept *".to_string(),
                "    ( ) Select an option".to_string(),
                "    ( ) Eng".to_string(),
                "    ( ) Option 2".to_string(),
            ]
        );
    }

    #[test]
    fn text_controls_show_kind_and_placeholder() {
        let field = Field::new("e", FieldType::Email, "Email").with_placeholder("you@work");
        let lines = control_lines(&FormRenderer::render_preview(&field, None));
        assert_eq!(lines[1], "    [email: you@work]");
    }

    #[test]
    fn recover_swallows_domain_errors() {
        let result = recover(Err(CliError::InvalidArguments("bad".into())));
        assert!(result.is_ok());
    }
}
