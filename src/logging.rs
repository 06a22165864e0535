use crate::models::LoggingConfig;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the level filter: `RUST_LOG` wins, otherwise debug or info.
fn env_filter(debug_mode: bool) -> EnvFilter {
    let default_level = if debug_mode { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Console-only subscriber for diagnostics emitted while the configuration loads.
///
/// Install it as a scoped default with [`tracing::subscriber::with_default`];
/// [`setup_logging`] takes over once the `logging` section is known.
pub fn bootstrap_subscriber(debug_mode: bool) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(debug_mode))
        .with_target(false)
        .finish()
}

/// Setup logging from the `logging` section of the configuration.
///
/// - Console output goes to stderr so stdout carries only the replacement log stream.
/// - When `dir` is set, logs are also written there with daily rotation, as plain
///   text or JSON lines.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep file logging
/// active, or `None` when no log directory is configured
pub fn setup_logging(options: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_writer, guard) = match &options.dir {
        Some(log_dir) => {
            // Create log directory if it doesn't exist
            let log_path = Utf8PathBuf::from(log_dir);
            if !log_path.exists() {
                fs::create_dir_all(&log_path)
                    .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
            }

            let file_appender = rolling::daily(log_dir, &options.prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    let text_file_layer = file_writer.clone().filter(|_| !options.json).map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let json_file_layer = file_writer.filter(|_| options.json).map(|writer| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let console_layer = options.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(options.debug))
        .with(text_file_layer)
        .with(json_file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        "Logging initialized: dir={:?}, prefix={}, debug={}, json={}, console={}",
        options.dir,
        options.prefix,
        options.debug,
        options.json,
        options.console
    );

    Ok(guard)
}
