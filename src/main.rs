#![forbid(unsafe_code)]

use clap::Parser;
use std::process::ExitCode;

use metabase_export::cli::Cli;
use metabase_export::{ExitStatus, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level.as_deref()) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitStatus::Failure.into();
    }

    match cli.execute() {
        Ok(path) => {
            println!(
                "The contents of card {} were successfully written to {}",
                cli.card_id,
                path.display()
            );
            ExitStatus::Success.into()
        }
        Err(e) => {
            let status = e.exit_status();
            tracing::error!(error = %e, exit_code = status.code(), "export failed");
            eprintln!("Error: {e}");
            status.into()
        }
    }
}
