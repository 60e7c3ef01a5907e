pub mod build_info;

use std::sync::Once;

use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "formdesk=info";

/// Initializes the global subscriber: `RUST_LOG`, then `formdesk=info`, then `extra`.
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_tracing(extra: Option<&str>) {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
            filter = filter.add_directive(directive);
        }
        let mut rejected = Vec::new();
        for raw in extra.into_iter().flat_map(|value| value.split(',')) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(_) => rejected.push(raw.to_string()),
            }
        }

        // A second global subscriber (tests, embedding) is not an error here.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();

        for directive in rejected {
            warn!(%directive, "ignoring invalid log filter directive");
        }
    });
}
