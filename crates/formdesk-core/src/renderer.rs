//! Maps fields to input controls.
//!
//! The mapping is a pure function of the field type, so the same field
//! always yields the same control kind. Presentation layers (terminal
//! prompts, tables) consume [`RenderedControl`] instead of branching on
//! `FieldType` themselves.

use formdesk_domain::{Field, FieldType, FieldValue, RecordData, Template};

/// Visible rows of a multi-line input.
pub const TEXTAREA_ROWS: u16 = 4;

/// Semantic kind of a single-line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
    Email,
    Password,
    Date,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Number => "number",
            InputKind::Email => "email",
            InputKind::Password => "password",
            InputKind::Date => "date",
        }
    }
}

/// One entry of a choice control. The blank entry has an empty `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    fn blank() -> Self {
        Self {
            value: String::new(),
            label: "Select an option".to_string(),
        }
    }

    /// Blank options keep their empty value but get a positional label.
    fn listed(index: usize, option: &str) -> Self {
        let label = if option.is_empty() {
            format!("Option {}", index + 1)
        } else {
            option.to_string()
        };
        Self {
            value: option.to_string(),
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Input(InputKind),
    TextArea { rows: u16 },
    Choice { options: Vec<ChoiceOption> },
}

impl ControlKind {
    pub fn for_field(field: &Field) -> Self {
        match field.field_type {
            FieldType::Text => ControlKind::Input(InputKind::Text),
            FieldType::Number => ControlKind::Input(InputKind::Number),
            FieldType::Email => ControlKind::Input(InputKind::Email),
            FieldType::Password => ControlKind::Input(InputKind::Password),
            FieldType::Date => ControlKind::Input(InputKind::Date),
            FieldType::Textarea => ControlKind::TextArea {
                rows: TEXTAREA_ROWS,
            },
            FieldType::Select => {
                let mut options = Vec::with_capacity(field.options().len() + 1);
                options.push(ChoiceOption::blank());
                options.extend(
                    field
                        .options()
                        .iter()
                        .enumerate()
                        .map(|(index, option)| ChoiceOption::listed(index, option)),
                );
                ControlKind::Choice { options }
            }
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, ControlKind::TextArea { .. })
    }
}

/// Editing context supplied by the caller for one field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub value: Option<&'a FieldValue>,
    pub error: Option<&'a str>,
    pub disabled: bool,
}

/// A control ready to be presented. `interactive` is false for previews,
/// which accept no change or blur events.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedControl {
    pub field_id: String,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub kind: ControlKind,
    pub value: String,
    pub error: Option<String>,
    pub disabled: bool,
    pub interactive: bool,
}

impl RenderedControl {
    /// Label with the required marker appended.
    pub fn display_label(&self) -> String {
        if self.required {
            format!("{} *", self.label)
        } else {
            self.label.clone()
        }
    }
}

pub struct FormRenderer;

impl FormRenderer {
    pub fn render(field: &Field, context: RenderContext<'_>) -> RenderedControl {
        RenderedControl {
            field_id: field.id.clone(),
            label: field.label.clone(),
            placeholder: field.placeholder_or_label().to_string(),
            required: field.required,
            kind: ControlKind::for_field(field),
            value: context
                .value
                .map(FieldValue::display_text)
                .unwrap_or_default(),
            error: context.error.map(str::to_string),
            disabled: context.disabled,
            interactive: !context.disabled,
        }
    }

    /// Read-only variant used by the builder preview and the record view.
    pub fn render_preview(field: &Field, value: Option<&FieldValue>) -> RenderedControl {
        Self::render(
            field,
            RenderContext {
                value,
                error: None,
                disabled: true,
            },
        )
    }

    /// Renders every field in `order`; stale keys in `data` are ignored.
    pub fn render_template(template: &Template, data: &RecordData) -> Vec<RenderedControl> {
        template
            .ordered_fields()
            .into_iter()
            .map(|field| Self::render_preview(field, data.get(&field.id)))
            .collect()
    }
}
