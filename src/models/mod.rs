//! Data models for File Replacer.
//!
//! - [`VariantFilename`]: A filename parsed as `name.tag.extension`
//! - [`ReplacementJob`] / [`ReplacementOutcome`]: One variant copy and what happened to it
//! - [`ScanSummary`]: Aggregated result and output log of a trigger invocation
//! - [`BuildScope`]: Project vs. solution builds, reported by the host
//! - [`ReplacerConfig`]: Exclusion list and logging settings loaded from `FileReplacer.yaml`
//!
//! All values are created per invocation and never persisted, except the config.

pub mod config;
pub mod outcome;
pub mod variant;

pub use config::{LoggingConfig, ReplacerConfig};
pub use outcome::{
    BuildScope, ReplacementJob, ReplacementOutcome, ReplacementStatus, ScanStatus, ScanSummary,
    SkipReason,
};
pub use variant::VariantFilename;
