use std::process;

use clap::Parser;

use formdesk::cli::{self, output, Cli};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli::run(cli) {
        tracing::debug!(error = ?err, "command failed");
        for message in err.user_messages() {
            output::error(message);
        }
        process::exit(1);
    }
}
