use colored::Colorize;
use std::fmt;
use std::sync::{OnceLock, RwLock};

use formdesk_core::{Notice, NoticeLevel};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Prompt,
    Section,
    Separator,
}

impl From<NoticeLevel> for MessageKind {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Success => MessageKind::Success,
            NoticeLevel::Info => MessageKind::Info,
            NoticeLevel::Error => MessageKind::Error,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OutputPreferences {
    pub color_enabled: bool,
    pub quiet_mode: bool,
}

impl Default for OutputPreferences {
    fn default() -> Self {
        Self {
            color_enabled: true,
            quiet_mode: false,
        }
    }
}

static PREFERENCES: OnceLock<RwLock<OutputPreferences>> = OnceLock::new();

pub fn set_preferences(prefs: OutputPreferences) {
    let lock = PREFERENCES.get_or_init(|| RwLock::new(OutputPreferences::default()));
    if let Ok(mut guard) = lock.write() {
        *guard = prefs;
    }
}

fn preferences() -> OutputPreferences {
    PREFERENCES
        .get_or_init(|| RwLock::new(OutputPreferences::default()))
        .read()
        .map(|guard| *guard)
        .unwrap_or_default()
}

fn label(kind: MessageKind) -> (&'static str, &'static str) {
    match kind {
        MessageKind::Info => ("INFO", "[i]"),
        MessageKind::Success => ("SUCCESS", "[✓]"),
        MessageKind::Warning => ("WARNING", "[!]"),
        MessageKind::Error => ("ERROR", "[x]"),
        MessageKind::Prompt => ("PROMPT", ">"),
        MessageKind::Section | MessageKind::Separator => ("", ""),
    }
}

/// Text for one message, styled when color output is enabled.
pub fn format_message(kind: MessageKind, message: impl fmt::Display, prefs: &OutputPreferences) -> String {
    let text = message.to_string();
    let plain = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        MessageKind::Separator => "-".repeat(40),
        _ => {
            let (name, icon) = label(kind);
            format!("{name}: {icon} {text}")
        }
    };

    if !prefs.color_enabled {
        return plain;
    }
    match kind {
        MessageKind::Success => plain.bright_green().to_string(),
        MessageKind::Warning => plain.bright_yellow().to_string(),
        MessageKind::Error => plain.bright_red().to_string(),
        MessageKind::Prompt => plain.bright_cyan().to_string(),
        MessageKind::Section => plain.bold().to_string(),
        MessageKind::Info | MessageKind::Separator => plain,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let prefs = preferences();
    if prefs.quiet_mode && matches!(kind, MessageKind::Info | MessageKind::Separator) {
        return;
    }
    let formatted = format_message(kind, message, &prefs);
    match kind {
        MessageKind::Section | MessageKind::Separator => println!("\n{formatted}"),
        MessageKind::Error | MessageKind::Warning => eprintln!("{formatted}"),
        _ => println!("{formatted}"),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

pub fn separator() {
    print(MessageKind::Separator, "");
}

/// Prints queued notices in the order they were raised.
pub fn notices(notices: impl IntoIterator<Item = Notice>) {
    for notice in notices {
        print(notice.level.into(), notice.message);
    }
}

/// Plain, unlabeled line (tables, JSON, detail rows).
pub fn line(text: impl fmt::Display) {
    println!("{text}");
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: OutputPreferences = OutputPreferences {
        color_enabled: false,
        quiet_mode: false,
    };

    #[test]
    fn plain_messages_carry_label_and_icon() {
        assert_eq!(
            format_message(MessageKind::Success, "Form saved successfully!", &PLAIN),
            "SUCCESS: [✓] Form saved successfully!"
        );
        assert_eq!(
            format_message(MessageKind::Error, "Failed to save form", &PLAIN),
            "ERROR: [x] Failed to save form"
        );
        assert_eq!(format_message(MessageKind::Section, " Templates ", &PLAIN), "=== Templates ===");
    }

    #[test]
    fn notice_levels_map_to_kinds() {
        assert_eq!(MessageKind::from(NoticeLevel::Success), MessageKind::Success);
        assert_eq!(MessageKind::from(NoticeLevel::Info), MessageKind::Info);
        assert_eq!(MessageKind::from(NoticeLevel::Error), MessageKind::Error);
    }
}
