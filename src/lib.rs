#![doc(test(attr(deny(warnings))))]

//! formdesk builds dynamic form templates and captures records against them.
//!
//! The heavy lifting lives in the workspace crates; this crate wires them to a
//! command line and an interactive shell.

pub mod cli;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
///
/// `filter` is an extra directive list (usually the config's `log_filter`).
pub fn init(filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::info!("formdesk tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init(None);
        super::init(Some("formdesk=debug"));
    }
}
