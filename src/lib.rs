// File Replacer - Copy configuration-specific file variants over their canonical file
//
// This is the library crate containing the matching, exclusion and replacement logic.
// The binary crate (main.rs) provides the command-line trigger.

pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{
    BuildScope, ReplacementJob, ReplacementOutcome, ReplacementStatus, ReplacerConfig,
    ScanStatus, ScanSummary, VariantFilename,
};
pub use services::{ExclusionSet, FsHost, Host, Orchestrator, classify};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
