//! Command-line trigger for File Replacer.
//!
//! The CLI stands in for an IDE: `build` is the pre-build hook, `saved` is the
//! document-saved hook. Both run the same [`Orchestrator`] over an [`FsHost`].
//!
//! # Commands
//!
//! - `build` - Replace every matching variant under a project root
//! - `saved` - Handle one saved variant file (always exits successfully)
//! - `classify` - Show how filenames split into name, tag and extension
//! - `init-config` - Write a default `FileReplacer.yaml`
//!
//! ```bash
//! file-replacer build --root ./MyProject --configuration Debug
//! file-replacer --exclude Web.config,Secrets.json build --configuration Release
//! file-replacer saved ./MyProject/App.Debug.config --configuration Debug
//! ```

use crate::config::{CONFIG_FILE_NAME, ConfigManager};
use crate::models::{BuildScope, ReplacerConfig, ReplacementStatus, ScanStatus};
use crate::services::{ExclusionSet, FsHost, Orchestrator, classify};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "file-replacer")]
#[command(version)]
#[command(
    about = "Copy configuration-specific file variants (name.Debug.config) over their canonical file",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (default: FileReplacer.yaml in the project root)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Canonical names never replaced, comma separated; replaces the configured list
    #[arg(long, global = true, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Also write rotating log files to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace all variants matching the active configuration before a build
    Build {
        /// Project root to scan
        #[arg(short, long, default_value = ".")]
        root: Utf8PathBuf,

        /// Active build configuration (e.g. Debug, Release)
        #[arg(short, long)]
        configuration: Option<String>,

        /// Scope of the build being started
        #[arg(long, value_enum, default_value_t = ScopeArg::Project)]
        scope: ScopeArg,
    },

    /// Handle a saved file as an editor's on-save hook would
    Saved {
        /// The file that was saved
        file: Utf8PathBuf,

        /// Project root (default: the file's directory)
        #[arg(short, long)]
        root: Option<Utf8PathBuf>,

        /// Active build configuration
        #[arg(short, long)]
        configuration: Option<String>,
    },

    /// Show how filenames are split into name, configuration tag and extension
    Classify {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Write a default FileReplacer.yaml
    InitConfig {
        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        dir: Utf8PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Project,
    Solution,
    Batch,
}

impl From<ScopeArg> for BuildScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Project => BuildScope::Project,
            ScopeArg::Solution => BuildScope::Solution,
            ScopeArg::Batch => BuildScope::Batch,
        }
    }
}

impl Cli {
    /// Directory whose FileReplacer.yaml applies to this invocation
    fn project_dir(&self) -> Utf8PathBuf {
        match &self.command {
            Commands::Build { root, .. } => root.clone(),
            Commands::Saved { file, root, .. } => root
                .clone()
                .unwrap_or_else(|| parent_dir(file).to_path_buf()),
            Commands::InitConfig { dir, .. } => dir.clone(),
            Commands::Classify { .. } => Utf8PathBuf::from("."),
        }
    }

    /// Load the layered configuration and apply command-line overrides
    pub fn load_config(&self) -> Result<ReplacerConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigManager::load_from_file(path)?,
            None => ConfigManager::new(self.project_dir()).load()?,
        };

        if let Some(exclude) = &self.exclude {
            config.exclude = exclude.clone();
        }
        if self.debug {
            config.logging.debug = true;
        }
        if let Some(log_dir) = &self.log_dir {
            config.logging.dir = Some(log_dir.clone());
        }

        Ok(config)
    }

    /// Execute the selected command
    ///
    /// # Returns
    /// The process exit code: failure when a build scan was refused, hit a fatal
    /// host error or failed on any file
    pub fn execute(self, config: ReplacerConfig) -> Result<ExitCode> {
        match self.command {
            Commands::Build {
                root,
                configuration,
                scope,
            } => run_build(&root, configuration.or(config.configuration.clone()), scope, &config),
            Commands::Saved {
                file,
                root,
                configuration,
            } => {
                let root = root.unwrap_or_else(|| parent_dir(&file).to_path_buf());
                run_saved(&file, &root, configuration.or(config.configuration.clone()), &config)
            }
            Commands::Classify { names } => {
                for name in &names {
                    println!("{}", describe(name));
                }
                Ok(ExitCode::SUCCESS)
            }
            Commands::InitConfig { dir, force } => {
                let manager = ConfigManager::new(&dir);
                if manager.config_path().exists() && !force {
                    bail!(
                        "{} already exists in {}, use --force to overwrite",
                        CONFIG_FILE_NAME,
                        dir
                    );
                }
                manager.save(&ReplacerConfig::default())?;
                println!("Wrote {}", manager.config_path());
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn build_host(configuration: Option<String>, scope: BuildScope) -> FsHost {
    let host = FsHost::new().with_scope(scope);
    match configuration {
        Some(configuration) => host.with_configuration(configuration),
        None => host,
    }
}

fn run_build(
    root: &Utf8Path,
    configuration: Option<String>,
    scope: ScopeArg,
    config: &ReplacerConfig,
) -> Result<ExitCode> {
    let root = root
        .canonicalize_utf8()
        .with_context(|| format!("Project root not found: {}", root))?;

    let host = build_host(configuration, scope.into());
    let orchestrator = Orchestrator::new(host, ExclusionSet::new(&config.exclude));

    let summary = orchestrator.build_begin(&root)?;
    for line in &summary.log {
        println!("{}", line);
    }
    orchestrator.metrics().log_summary();

    let ok = summary.status == ScanStatus::Completed && !summary.has_failures();
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_saved(
    file: &Utf8Path,
    root: &Utf8Path,
    configuration: Option<String>,
    config: &ReplacerConfig,
) -> Result<ExitCode> {
    let host = build_host(configuration, BuildScope::Project);
    let orchestrator = Orchestrator::new(host, ExclusionSet::new(&config.exclude));

    if let Some(summary) = orchestrator.document_saved(file, root) {
        for outcome in &summary.outcomes {
            match outcome.status {
                ReplacementStatus::Replaced => {
                    tracing::info!("Replaced {} with {}", outcome.job.dest, outcome.job.source)
                }
                ReplacementStatus::Failed => {
                    tracing::warn!("Could not replace {}: {}", outcome.job.dest, outcome.reason)
                }
                ReplacementStatus::Skipped => {}
            }
        }
    }
    orchestrator.metrics().log_summary();

    // Save hooks are fire-and-forget
    Ok(ExitCode::SUCCESS)
}

fn parent_dir(file: &Utf8Path) -> &Utf8Path {
    match file.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

fn describe(name: &str) -> String {
    match classify(name) {
        Some(v) => format!(
            "{}: name={} tag={} extension={} -> {}",
            name,
            v.base_name,
            v.config_tag,
            v.extension,
            v.canonical_name()
        ),
        None => format!("{}: no match", name),
    }
}
