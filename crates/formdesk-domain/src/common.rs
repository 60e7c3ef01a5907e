//! Shared traits for form primitives.

/// Exposes a server-assigned identifier, absent until the entity is first saved.
pub trait Identifiable {
    fn id(&self) -> Option<u64>;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Returns `true` when the optional text is missing or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|text| text.trim().is_empty()).unwrap_or(true)
}
