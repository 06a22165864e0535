use camino::Utf8PathBuf;
use std::fmt;
use std::time::Duration;

/// Scope of the build the host is about to run.
///
/// Replacement only makes sense for a single project: a solution build spans
/// several project roots and the orchestrator refuses to guess which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildScope {
    #[default]
    Project,
    Solution,
    Batch,
}

impl BuildScope {
    pub fn is_project(self) -> bool {
        matches!(self, BuildScope::Project)
    }
}

/// A single variant-over-canonical copy, consumed once by the replacement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementJob {
    pub source: Utf8PathBuf,
    pub dest: Utf8PathBuf,
    pub project_root: Utf8PathBuf,
}

/// Status of a single replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStatus {
    Replaced,
    Skipped,
    Failed,
}

/// Result of processing one [`ReplacementJob`]
#[derive(Debug, Clone)]
pub struct ReplacementOutcome {
    pub job: ReplacementJob,
    pub status: ReplacementStatus,
    pub reason: String,
    pub duration: Duration,
}

impl ReplacementOutcome {
    pub fn replaced(job: ReplacementJob, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            job,
            status: ReplacementStatus::Replaced,
            reason: reason.into(),
            duration,
        }
    }

    pub fn skipped(job: ReplacementJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: ReplacementStatus::Skipped,
            reason: reason.into(),
            duration: Duration::ZERO,
        }
    }

    pub fn failed(job: ReplacementJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            status: ReplacementStatus::Failed,
            reason: reason.into(),
            duration: Duration::ZERO,
        }
    }
}

/// Why a whole scan was not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WrongBuildScope,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WrongBuildScope => f.write_str("WrongBuildScope"),
        }
    }
}

/// Overall state of a finished scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Skipped(SkipReason),
    Cancelled,
}

/// Aggregated result of one trigger invocation.
///
/// `log` holds the line-oriented output stream in the order it was produced,
/// ending with the `"<N> file(s) replaced"` summary for build scans.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub status: ScanStatus,
    pub total_scanned: usize,
    pub replaced_count: usize,
    pub outcomes: Vec<ReplacementOutcome>,
    pub log: Vec<String>,
}

impl ScanSummary {
    pub fn new() -> Self {
        Self {
            status: ScanStatus::Completed,
            total_scanned: 0,
            replaced_count: 0,
            outcomes: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            status: ScanStatus::Skipped(reason),
            ..Self::new()
        }
    }

    /// Append an outcome, keeping `replaced_count` in sync
    pub fn record(&mut self, outcome: ReplacementOutcome) {
        if outcome.status == ReplacementStatus::Replaced {
            self.replaced_count += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Append a line to the output stream and mirror it to tracing
    pub fn log_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.log.push(line);
    }

    pub fn skipped_count(&self) -> usize {
        self.count(ReplacementStatus::Skipped)
    }

    pub fn failed_count(&self) -> usize {
        self.count(ReplacementStatus::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    fn count(&self, status: ReplacementStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

impl Default for ScanSummary {
    fn default() -> Self {
        Self::new()
    }
}
