//! Services module - The variant resolution and replacement pipeline.
//!
//! The services are **host-agnostic**: everything they need from the environment goes
//! through the [`Host`] trait, so the same pipeline serves a file-save hook, a pre-build
//! step or the CLI.
//!
//! # Components
//!
//! - [`matcher`]: Parses `name.tag.extension` filenames ([`VariantMatcher`], [`classify`])
//! - [`exclusion`]: Case-insensitive set of canonical names never replaced ([`ExclusionSet`])
//! - [`host`]: The [`Host`] capability trait and the filesystem implementation [`FsHost`]
//! - [`replacement`]: Copies one variant over its canonical file ([`ReplacementEngine`])
//! - [`orchestrator`]: Walks a project or handles a saved file and aggregates outcomes
//!   ([`Orchestrator`])
//! - [`locks`]: Serializes runs over the same project root ([`RootLocks`])
//!
//! # Data flow
//!
//! ```text
//! trigger → Orchestrator (enumerate) → VariantMatcher (classify)
//!         → ExclusionSet (admit/reject) → tag == active configuration?
//!         → ReplacementEngine (text replace or byte copy) → ScanSummary
//! ```
//!
//! # Usage Example
//!
//! ```ignore
//! use camino::Utf8Path;
//! use file_replacer::services::{ExclusionSet, FsHost, Orchestrator};
//!
//! let host = FsHost::new().with_configuration("Debug");
//! let orchestrator = Orchestrator::new(host, ExclusionSet::new(["Web.config"]));
//!
//! let summary = orchestrator.build_begin(Utf8Path::new("path/to/project"))?;
//! for line in &summary.log {
//!     println!("{}", line);
//! }
//! ```

pub mod exclusion;
pub mod host;
pub mod locks;
pub mod matcher;
pub mod orchestrator;
pub mod replacement;

pub use exclusion::{ExclusionSet, is_excluded};
pub use host::{FsHost, Host, HostError};
pub use locks::{RootGuard, RootLocks};
pub use matcher::{VariantMatcher, classify};
pub use orchestrator::{
    CancellationFlag, Orchestrator, REPLACING_FILES_MESSAGE, ReplacerError, WRONG_SCOPE_MESSAGE,
};
pub use replacement::{EngineError, ReplacementEngine};
