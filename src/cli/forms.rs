//! Field-by-field record entry on top of [`RecordEngine`].
//!
//! The runner walks the rendered controls in display order, feeds every answer
//! through the engine (so touch/validate rules stay in one place) and ends with
//! a confirmation step that submits. Prompting is behind [`FormInteraction`] so
//! the flow can be driven without a terminal.

use dialoguer::{theme::ColorfulTheme, Input, Password, Select};
use tracing::debug;

use formdesk_core::{ControlKind, CoreError, InputKind, RecordEngine, RecordSubmitter, RenderedControl};
use formdesk_domain::Record;

use crate::cli::io;
use crate::errors::CliError;

/// High-level lifecycle states emitted by the form runner.
#[derive(Debug, Clone, PartialEq)]
pub enum FormResult<T> {
    Completed(T),
    Cancelled,
}

/// Describes how prompts can be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// User supplied a concrete value.
    Value(String),
    /// Keep the current value.
    Keep,
    /// Abort the entire form immediately.
    Cancel,
    /// Go back to the previous field.
    Back,
    /// Show the field's hint and ask again.
    Help,
}

/// Responses accepted when confirming the collected data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Confirm,
    Back,
    Cancel,
}

/// Label/value pairs shown before submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSummary {
    pub entries: Vec<(String, String)>,
}

impl FormSummary {
    fn from_controls(controls: &[RenderedControl]) -> Self {
        Self {
            entries: controls
                .iter()
                .map(|control| (control.display_label(), control.value.clone()))
                .collect(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let width = self
            .entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        self.entries
            .iter()
            .map(|(label, value)| {
                let value = if value.is_empty() { "-" } else { value.as_str() };
                format!("  {label:<width$} : {value}")
            })
            .collect()
    }
}

pub struct PromptContext<'a> {
    pub control: &'a RenderedControl,
    pub index: usize,
    pub total: usize,
}

pub trait FormInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse;

    fn confirm(&mut self, summary: &FormSummary, lines: &[String]) -> ConfirmationResponse;

    /// Called when a field is shown again because of a validation error.
    fn show_error(&mut self, _control: &RenderedControl, message: &str) {
        io::print_error(message);
    }
}

/// Drives a [`RecordEngine`] through a [`FormInteraction`].
pub struct RecordForm<'e, 'a> {
    engine: &'e mut RecordEngine<'a>,
}

impl<'e, 'a> RecordForm<'e, 'a> {
    pub fn new(engine: &'e mut RecordEngine<'a>) -> Self {
        Self { engine }
    }

    /// Prompts until the user confirms or cancels.
    ///
    /// Submission failures are returned as errors; the engine's notices
    /// describe them for display.
    pub fn run<I, S>(&mut self, interaction: &mut I, submitter: &mut S) -> Result<FormResult<Record>, CliError>
    where
        I: FormInteraction,
        S: RecordSubmitter + ?Sized,
    {
        let total = self.engine.template().fields.len();
        let mut index = 0;

        loop {
            let controls = self.engine.controls();
            if index >= total {
                let summary = FormSummary::from_controls(&controls);
                let lines = summary.lines();
                match interaction.confirm(&summary, &lines) {
                    ConfirmationResponse::Confirm => match self.engine.submit(submitter) {
                        Ok(record) => return Ok(FormResult::Completed(record)),
                        Err(CoreError::FieldErrors(errors)) => {
                            // Resume at the first offending field in display order.
                            index = controls
                                .iter()
                                .position(|control| errors.contains_key(&control.field_id))
                                .unwrap_or(0);
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    },
                    ConfirmationResponse::Back => {
                        if total == 0 {
                            return Ok(FormResult::Cancelled);
                        }
                        index = total - 1;
                        continue;
                    }
                    ConfirmationResponse::Cancel => return Ok(FormResult::Cancelled),
                }
            }

            let Some(control) = controls.get(index) else {
                index = total;
                continue;
            };
            if let Some(error) = control.error.as_deref() {
                interaction.show_error(control, error);
            }
            let context = PromptContext {
                control,
                index,
                total,
            };
            let field_id = control.field_id.clone();
            match interaction.prompt_field(&context) {
                PromptResponse::Value(raw) => {
                    self.engine.set_input(&field_id, &raw)?;
                    if self.engine.touch(&field_id)?.is_none() {
                        index += 1;
                    }
                }
                PromptResponse::Keep => {
                    if self.engine.touch(&field_id)?.is_none() {
                        index += 1;
                    }
                }
                PromptResponse::Back => index = index.saturating_sub(1),
                PromptResponse::Help => io::print_info(field_hint(control)),
                PromptResponse::Cancel => {
                    debug!(template = %self.engine.template().name, "record form cancelled");
                    return Ok(FormResult::Cancelled);
                }
            }
        }
    }
}

fn field_hint(control: &RenderedControl) -> String {
    let kind = match &control.kind {
        ControlKind::Input(kind) => kind.as_str().to_string(),
        ControlKind::TextArea { .. } => "textarea".to_string(),
        ControlKind::Choice { options } => format!(
            "one of: {}",
            options
                .iter()
                .filter(|option| !option.value.is_empty())
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let required = if control.required { "required" } else { "optional" };
    format!("{} ({kind}, {required}): {}", control.label, control.placeholder)
}

/// Terminal implementation using dialoguer prompts.
///
/// Text prompts understand `:back`, `:cancel` and `:help`; an unchanged
/// prefilled value, or an empty answer to a password that is already set,
/// counts as keeping it.
pub struct DialoguerInteraction {
    theme: ColorfulTheme,
}

impl Default for DialoguerInteraction {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl DialoguerInteraction {
    fn prompt_label(context: &PromptContext<'_>) -> String {
        format!(
            "[{}/{}] {}",
            context.index + 1,
            context.total,
            context.control.display_label()
        )
    }

    fn prompt_text(&self, context: &PromptContext<'_>) -> PromptResponse {
        let control = context.control;
        let result = match control.kind {
            ControlKind::Input(InputKind::Password) => Password::with_theme(&self.theme)
                .with_prompt(Self::prompt_label(context))
                .allow_empty_password(true)
                .interact(),
            _ => Input::<String>::with_theme(&self.theme)
                .with_prompt(Self::prompt_label(context))
                .with_initial_text(initial_text(control))
                .allow_empty(true)
                .interact_text(),
        };
        match result {
            Ok(raw) => interpret_answer(control, &raw),
            Err(_) => PromptResponse::Cancel,
        }
    }

    fn prompt_choice(&self, context: &PromptContext<'_>) -> PromptResponse {
        let ControlKind::Choice { options } = &context.control.kind else {
            return self.prompt_text(context);
        };
        let mut items: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        items.push("<< Back");
        let current = options
            .iter()
            .position(|option| option.value == context.control.value)
            .unwrap_or(0);
        match Select::with_theme(&self.theme)
            .with_prompt(Self::prompt_label(context))
            .items(&items)
            .default(current)
            .interact_opt()
        {
            Ok(Some(choice)) if choice < options.len() => {
                PromptResponse::Value(options[choice].value.clone())
            }
            Ok(Some(_)) => PromptResponse::Back,
            Ok(None) | Err(_) => PromptResponse::Cancel,
        }
    }
}

impl FormInteraction for DialoguerInteraction {
    fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
        match context.control.kind {
            ControlKind::Choice { .. } => self.prompt_choice(context),
            _ => self.prompt_text(context),
        }
    }

    fn confirm(&mut self, _summary: &FormSummary, lines: &[String]) -> ConfirmationResponse {
        for line in lines {
            io::print_info(line);
        }
        let items = ["Submit", "Edit previous field", "Cancel"];
        match Select::with_theme(&self.theme)
            .with_prompt("Save this record?")
            .items(&items)
            .default(0)
            .interact_opt()
        {
            Ok(Some(0)) => ConfirmationResponse::Confirm,
            Ok(Some(1)) => ConfirmationResponse::Back,
            _ => ConfirmationResponse::Cancel,
        }
    }
}

/// Single-line prompts show textarea line breaks as a literal `\n`.
fn initial_text(control: &RenderedControl) -> String {
    if control.kind.is_multiline() {
        control.value.replace('\n', "\\n")
    } else {
        control.value.clone()
    }
}

/// Password prompts start empty, so an empty answer keeps a stored secret.
fn interpret_answer(control: &RenderedControl, raw: &str) -> PromptResponse {
    match control.kind {
        ControlKind::Input(InputKind::Password) if raw.is_empty() && !control.value.is_empty() => {
            PromptResponse::Keep
        }
        _ if control.kind.is_multiline() => {
            interpret_text(&raw.replace("\\n", "\n"), &control.value)
        }
        _ => interpret_text(raw, &control.value),
    }
}

fn interpret_text(raw: &str, current: &str) -> PromptResponse {
    match raw.trim() {
        ":back" => PromptResponse::Back,
        ":cancel" => PromptResponse::Cancel,
        ":help" => PromptResponse::Help,
        _ if raw == current => PromptResponse::Keep,
        _ => PromptResponse::Value(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use formdesk_core::{RecordSubmission, FIX_ERRORS};
    use formdesk_domain::{Field, FieldType, FieldValue, Template};

    struct MockInteraction {
        prompts: VecDeque<PromptResponse>,
        confirmations: VecDeque<ConfirmationResponse>,
        seen: Vec<String>,
        errors: Vec<String>,
    }

    impl MockInteraction {
        fn new(prompts: Vec<PromptResponse>, confirmations: Vec<ConfirmationResponse>) -> Self {
            Self {
                prompts: prompts.into(),
                confirmations: confirmations.into(),
                seen: Vec::new(),
                errors: Vec::new(),
            }
        }
    }

    /// Answers with raw terminal text, interpreted the way the dialoguer prompts do.
    struct TypedInteraction {
        answers: VecDeque<&'static str>,
    }

    impl FormInteraction for TypedInteraction {
        fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
            match self.answers.pop_front() {
                Some(raw) => interpret_answer(context.control, raw),
                None => PromptResponse::Cancel,
            }
        }

        fn confirm(&mut self, _summary: &FormSummary, _lines: &[String]) -> ConfirmationResponse {
            ConfirmationResponse::Confirm
        }
    }

    impl FormInteraction for MockInteraction {
        fn prompt_field(&mut self, context: &PromptContext<'_>) -> PromptResponse {
            self.seen.push(context.control.field_id.clone());
            // An exhausted script cancels so a stuck form cannot spin forever.
            self.prompts.pop_front().unwrap_or(PromptResponse::Cancel)
        }

        fn confirm(&mut self, _summary: &FormSummary, _lines: &[String]) -> ConfirmationResponse {
            self.confirmations
                .pop_front()
                .unwrap_or(ConfirmationResponse::Cancel)
        }

        fn show_error(&mut self, _control: &RenderedControl, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    #[derive(Default)]
    struct Capture {
        submissions: Vec<RecordSubmission>,
        reject: bool,
    }

    impl RecordSubmitter for Capture {
        fn submit_record(&mut self, submission: RecordSubmission) -> Result<Record, CoreError> {
            self.submissions.push(submission.clone());
            if self.reject {
                return Err(CoreError::rejected_field("data", "Name is required"));
            }
            let mut record = Record::new(5);
            record.id = Some(11);
            if let RecordSubmission::Create(payload) = submission {
                record.data = payload.data;
            }
            Ok(record)
        }
    }

    fn template() -> Template {
        let mut template = Template::new("Onboarding")
            .with_field(Field::new("name", FieldType::Text, "Name").with_required())
            .with_field(
                Field::new("email", FieldType::Email, "Email")
                    .with_order(1),
            )
            .with_field(
                Field::new("dept", FieldType::Select, "Dept")
                    .with_order(2)
                    .with_options(["Eng", "Sales"]),
            );
        template.id = Some(5);
        template
    }

    fn value(text: &str) -> PromptResponse {
        PromptResponse::Value(text.into())
    }

    #[test]
    fn completes_and_submits_collected_values() {
        let template = template();
        let mut engine = RecordEngine::create(&template).expect("engine");
        let mut interaction = MockInteraction::new(
            vec![value("Alice"), value("alice@example.com"), value("Eng")],
            vec![ConfirmationResponse::Confirm],
        );
        let mut capture = Capture::default();

        let result = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect("run form");

        let FormResult::Completed(record) = result else {
            panic!("expected completed form");
        };
        assert_eq!(record.id, Some(11));
        assert_eq!(record.value("dept"), Some(&FieldValue::text("Eng")));
        assert_eq!(interaction.seen, vec!["name", "email", "dept"]);
        assert_eq!(capture.submissions.len(), 1);
    }

    #[test]
    fn invalid_answer_repeats_the_field_with_its_error() {
        let template = template();
        let mut engine = RecordEngine::create(&template).expect("engine");
        let mut interaction = MockInteraction::new(
            vec![
                value(""),
                value("Alice"),
                value("not-an-email"),
                value("a@b.co"),
                PromptResponse::Keep,
            ],
            vec![ConfirmationResponse::Confirm],
        );
        let mut capture = Capture::default();

        let result = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect("run form");

        assert!(matches!(result, FormResult::Completed(_)));
        assert_eq!(interaction.seen, vec!["name", "name", "email", "email", "dept"]);
        assert_eq!(interaction.errors.len(), 2);
        assert!(interaction.errors[0].contains("required"));
    }

    #[test]
    fn back_and_cancel_move_through_the_form() {
        let template = template();
        let mut engine = RecordEngine::create(&template).expect("engine");
        let mut interaction = MockInteraction::new(
            vec![
                value("Alice"),
                PromptResponse::Back,
                PromptResponse::Keep,
                PromptResponse::Cancel,
            ],
            vec![],
        );
        let mut capture = Capture::default();

        let result = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect("run form");

        assert_eq!(result, FormResult::Cancelled);
        assert_eq!(interaction.seen, vec!["name", "email", "name", "email"]);
        assert!(capture.submissions.is_empty());
        assert_eq!(engine.value("name"), Some(&FieldValue::text("Alice")));
    }

    #[test]
    fn confirmation_back_returns_to_last_field() {
        let template = template();
        let mut engine = RecordEngine::create(&template).expect("engine");
        let mut interaction = MockInteraction::new(
            vec![value("Alice"), PromptResponse::Keep, PromptResponse::Keep, value("Sales")],
            vec![ConfirmationResponse::Back, ConfirmationResponse::Confirm],
        );
        let mut capture = Capture::default();

        let result = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect("run form");

        let FormResult::Completed(record) = result else {
            panic!("expected completed form");
        };
        assert_eq!(record.value("dept"), Some(&FieldValue::text("Sales")));
        assert_eq!(interaction.seen, vec!["name", "email", "dept", "dept"]);
    }

    #[test]
    fn rejected_submission_surfaces_error_and_notices() {
        let template = template();
        let mut engine = RecordEngine::create(&template).expect("engine");
        let mut interaction = MockInteraction::new(
            vec![value("Alice"), PromptResponse::Keep, PromptResponse::Keep],
            vec![ConfirmationResponse::Confirm],
        );
        let mut capture = Capture {
            reject: true,
            ..Capture::default()
        };

        let err = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect_err("rejected");
        assert!(matches!(err, CliError::Core(CoreError::Rejected(_))));
        let notices = engine.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "data: Name is required");
        assert!(!notices.iter().any(|notice| notice.message == FIX_ERRORS));
    }

    #[test]
    fn text_answers_map_to_responses() {
        assert_eq!(interpret_text(":back", "x"), PromptResponse::Back);
        assert_eq!(interpret_text(" :cancel ", ""), PromptResponse::Cancel);
        assert_eq!(interpret_text(":help", ""), PromptResponse::Help);
        assert_eq!(interpret_text("Alice", "Alice"), PromptResponse::Keep);
        assert_eq!(interpret_text("Bob", "Alice"), value("Bob"));
    }

    #[test]
    fn empty_password_answer_keeps_the_stored_secret() {
        let mut template = Template::new("Access")
            .with_field(Field::new("name", FieldType::Text, "Name").with_required())
            .with_field(Field::new("pin", FieldType::Password, "PIN").with_order(1));
        template.id = Some(5);
        let mut existing = Record::new(5)
            .with_value("name", "Alice")
            .with_value("pin", "s3cret");
        existing.id = Some(11);

        let mut engine = RecordEngine::edit(&template, &existing).expect("engine");
        let mut interaction = TypedInteraction {
            answers: VecDeque::from(["Alice", ""]),
        };
        let mut capture = Capture::default();

        let result = RecordForm::new(&mut engine)
            .run(&mut interaction, &mut capture)
            .expect("run form");

        assert!(matches!(result, FormResult::Completed(_)));
        let Some(RecordSubmission::Update { id, payload }) = capture.submissions.first() else {
            panic!("expected an update submission");
        };
        assert_eq!(*id, 11);
        assert_eq!(payload.data.get("pin"), Some(&FieldValue::text("s3cret")));
    }

    #[test]
    fn empty_password_answer_is_a_value_when_nothing_is_stored() {
        let mut template = Template::new("Access")
            .with_field(Field::new("pin", FieldType::Password, "PIN").with_required());
        template.id = Some(5);
        let engine = RecordEngine::create(&template).expect("engine");
        let controls = engine.controls();
        assert_eq!(interpret_answer(&controls[0], ""), value(""));
        assert_eq!(interpret_answer(&controls[0], ":back"), PromptResponse::Back);
    }

    #[test]
    fn textarea_answers_turn_escaped_breaks_into_newlines() {
        let mut template = Template::new("Notes")
            .with_field(Field::new("notes", FieldType::Textarea, "Notes"));
        template.id = Some(5);
        let mut existing = Record::new(5).with_value("notes", "line one\nline two");
        existing.id = Some(3);
        let engine = RecordEngine::edit(&template, &existing).expect("engine");
        let controls = engine.controls();

        assert_eq!(initial_text(&controls[0]), "line one\\nline two");
        assert_eq!(
            interpret_answer(&controls[0], "line one\\nline two"),
            PromptResponse::Keep
        );
        assert_eq!(interpret_answer(&controls[0], "a\\nb"), value("a\nb"));
    }

    #[test]
    fn summary_marks_required_fields_and_blank_values() {
        let template = template();
        let engine = RecordEngine::create(&template).expect("engine");
        let summary = FormSummary::from_controls(&engine.controls());
        let lines = summary.lines();
        assert_eq!(lines[0], "  Name * : -");
        assert_eq!(lines[1], "  Email  : -");
    }
}
