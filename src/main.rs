//! File Replacer - configuration variant substitution
//!
//! Main entry point for the command-line trigger.
//!
//! # Execution Flow
//!
//! 1. Parse arguments ([`Cli`])
//! 2. Load `FileReplacer.yaml` (project root or `--config`), then environment
//!    overrides, then command-line overrides. A stderr-only subscriber covers this step.
//! 3. Initialize logging from the loaded `logging` section (stderr, plus rotating
//!    files when `logging.dir` is set)
//! 4. Run the command; the replacement log stream is printed to stdout
//!
//! # Exit Status
//!
//! `build` fails when the scan was refused (solution scope), the host was unusable
//! or any file failed to replace. `saved` always succeeds.

use anyhow::Result;
use clap::Parser;
use file_replacer::cli::Cli;
use file_replacer::{APP_NAME, VERSION, logging};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Config diagnostics go to stderr before the configured subscriber exists
    let config = tracing::subscriber::with_default(
        logging::bootstrap_subscriber(cli.debug),
        || cli.load_config(),
    )?;

    // Held until exit so buffered file logs are flushed
    let _guard = logging::setup_logging(&config.logging)?;

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);
    tracing::debug!("Excluded files: {:?}", config.exclude);

    cli.execute(config)
}
