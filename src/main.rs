//! Ticketdesk CLI

use std::{io, process::ExitCode};

use tracing::error;

use ticketdesk::{cli, config::Config, observability};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => err.exit(),
    };

    if let Err(err) = observability::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for setup errors"
        )]
        {
            eprintln!("Logging setup error: {err}");
        }

        return ExitCode::FAILURE;
    }

    match cli::run(&config, io::stdout().lock()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");

            #[expect(clippy::print_stderr, reason = "user-facing command error")]
            {
                eprintln!("{err}");
            }

            ExitCode::FAILURE
        }
    }
}
