use crate::metrics::Metrics;
use crate::models::{
    ReplacementJob, ReplacementOutcome, ScanStatus, ScanSummary, SkipReason, VariantFilename,
};
use crate::services::exclusion::ExclusionSet;
use crate::services::host::Host;
use crate::services::locks::RootLocks;
use crate::services::matcher::VariantMatcher;
use crate::services::replacement::{EngineError, ReplacementEngine};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// First line of every build scan
pub const REPLACING_FILES_MESSAGE: &str = "Replacing files...";

/// Logged when a build is not scoped to a single project
pub const WRONG_SCOPE_MESSAGE: &str =
    "Can't replace files when building from solution. Build project instead.";

/// Errors that stop a whole trigger invocation
#[derive(Error, Debug)]
pub enum ReplacerError {
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),
}

/// Cooperative cancellation, checked between files
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives the classify → exclude → match → replace pipeline for the two triggers.
///
/// # Entry points
///
/// - [`on_file_saved`](Self::on_file_saved): one saved variant replaces its canonical file
///   when its tag names the active configuration. Exclusions are silent here.
/// - [`on_build_begin`](Self::on_build_begin): every file under the project root is
///   classified, jobs are collected in walk order and then executed one by one. Each
///   excluded candidate and each replacement is logged, followed by `"<N> file(s) replaced"`.
///
/// [`document_saved`](Self::document_saved) and [`build_begin`](Self::build_begin) are the
/// host-facing adapters that fetch the active configuration themselves.
///
/// Both entry points hold the [`RootLocks`] entry for their project root for the whole run,
/// so a save and a build over the same root never interleave. Per-file failures are recorded
/// as `Failed` outcomes and the scan continues; only an unavailable host aborts.
pub struct Orchestrator<H: Host> {
    host: H,
    matcher: VariantMatcher,
    exclusions: ExclusionSet,
    locks: RootLocks,
    metrics: Arc<Metrics>,
    cancel: CancellationFlag,
}

impl<H: Host> Orchestrator<H> {
    pub fn new(host: H, exclusions: ExclusionSet) -> Self {
        Self {
            host,
            matcher: VariantMatcher::new(),
            exclusions,
            locks: RootLocks::new(),
            metrics: Arc::new(Metrics::new()),
            cancel: CancellationFlag::new(),
        }
    }

    /// Share a lock registry with other orchestrators over the same tree
    pub fn with_locks(mut self, locks: RootLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Replace the canonical file of a just-saved variant.
    ///
    /// # Arguments
    /// * `saved_file` - Full path of the saved file
    /// * `active_configuration` - Build configuration name, compared case-insensitively
    /// * `project_root` - Root whose lock is held during the replacement
    ///
    /// # Returns
    /// A summary with at most one outcome. Non-variants, excluded files and files for
    /// other configurations produce no log lines.
    pub fn on_file_saved(
        &self,
        saved_file: &Utf8Path,
        active_configuration: &str,
        project_root: &Utf8Path,
    ) -> Result<ScanSummary, ReplacerError> {
        let _guard = self.locks.acquire(project_root);
        self.metrics.record_scan();

        let mut summary = ScanSummary::new();
        summary.total_scanned = 1;

        let Some(variant) = saved_file.file_name().and_then(|n| self.matcher.classify(n)) else {
            tracing::debug!("{} is not a variant file", saved_file);
            return Ok(summary);
        };

        let job = job_for(saved_file, &variant, project_root);

        if self.exclusions.excludes_variant(&variant) {
            tracing::debug!("{} is excluded", job.dest);
            self.record(&mut summary, ReplacementOutcome::skipped(job, "excluded"));
            return Ok(summary);
        }

        if !variant.matches_configuration(active_configuration) {
            tracing::debug!(
                "{} is for configuration {}, active is {}",
                saved_file,
                variant.config_tag,
                active_configuration
            );
            return Ok(summary);
        }

        self.execute(job, &mut summary, false)?;
        Ok(summary)
    }

    /// Replace every variant under `project_root` that matches the active configuration.
    ///
    /// Refuses to run, before touching any file, when the host reports a build scope
    /// other than a single project.
    pub fn on_build_begin(
        &self,
        project_root: &Utf8Path,
        active_configuration: &str,
    ) -> Result<ScanSummary, ReplacerError> {
        if !self.host.build_scope().is_project() {
            return Ok(wrong_scope_summary());
        }

        let _guard = self.locks.acquire(project_root);
        self.metrics.record_scan();

        let mut summary = ScanSummary::new();
        summary.log_line(REPLACING_FILES_MESSAGE);

        let files = self
            .host
            .enumerate_files(project_root)
            .map_err(|e| ReplacerError::HostUnavailable(e.to_string()))?;
        summary.total_scanned = files.len();

        let mut jobs = Vec::new();
        for file in &files {
            let Some(variant) = file.file_name().and_then(|n| self.matcher.classify(n)) else {
                continue;
            };

            let job = job_for(file, &variant, project_root);

            if self.exclusions.excludes_variant(&variant) {
                summary.log_line(format!("File {} was excluded", file));
                self.record(&mut summary, ReplacementOutcome::skipped(job, "excluded"));
                continue;
            }

            if variant.matches_configuration(active_configuration) {
                jobs.push(job);
            } else {
                tracing::debug!("Ignoring {} (configuration {})", file, variant.config_tag);
            }
        }

        tracing::debug!(
            "{} of {} files selected for configuration {}",
            jobs.len(),
            files.len(),
            active_configuration
        );

        for job in jobs {
            if self.cancel.is_cancelled() {
                tracing::warn!("Replacement cancelled before {}", job.source);
                summary.status = ScanStatus::Cancelled;
                break;
            }

            summary.log_line(format!("Replacing {} with {}", job.dest, job.source));
            self.execute(job, &mut summary, true)?;
        }

        let replaced = summary.replaced_count;
        summary.log_line(format!("{} file(s) replaced", replaced));
        Ok(summary)
    }

    /// Host-facing save trigger. Fire-and-forget: every error is logged and swallowed.
    pub fn document_saved(&self, saved_file: &Utf8Path, project_root: &Utf8Path) -> Option<ScanSummary> {
        let configuration = match self.host.active_configuration(project_root) {
            Ok(configuration) => configuration,
            Err(e) => {
                tracing::warn!("Cannot replace after saving {}: {}", saved_file, e);
                return None;
            }
        };

        match self.on_file_saved(saved_file, &configuration, project_root) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Replacement after saving {} failed: {}", saved_file, e);
                None
            }
        }
    }

    /// Host-facing build trigger; queries scope and active configuration from the host
    pub fn build_begin(&self, project_root: &Utf8Path) -> Result<ScanSummary, ReplacerError> {
        if !self.host.build_scope().is_project() {
            return Ok(wrong_scope_summary());
        }

        let configuration = self
            .host
            .active_configuration(project_root)
            .map_err(|e| ReplacerError::HostUnavailable(e.to_string()))?;

        self.on_build_begin(project_root, &configuration)
    }

    fn execute(
        &self,
        job: ReplacementJob,
        summary: &mut ScanSummary,
        log_failures: bool,
    ) -> Result<(), ReplacerError> {
        let outcome = match ReplacementEngine::new(&self.host).replace(job.clone()) {
            Ok(outcome) => outcome,
            Err(EngineError::HostUnavailable(reason)) => {
                return Err(ReplacerError::HostUnavailable(reason));
            }
            Err(e) => {
                let line = format!("Failed to replace {}: {}", job.dest, e);
                if log_failures {
                    summary.log_line(line);
                } else {
                    tracing::warn!("{}", line);
                }
                ReplacementOutcome::failed(job, e.to_string())
            }
        };

        self.record(summary, outcome);
        Ok(())
    }

    fn record(&self, summary: &mut ScanSummary, outcome: ReplacementOutcome) {
        self.metrics.record_outcome(&outcome);
        summary.record(outcome);
    }
}

/// The canonical file lives next to its variant
fn job_for(file: &Utf8Path, variant: &VariantFilename, project_root: &Utf8Path) -> ReplacementJob {
    let dir = file.parent().unwrap_or(Utf8Path::new(""));
    ReplacementJob {
        source: file.to_path_buf(),
        dest: dir.join(variant.canonical_name()),
        project_root: Utf8PathBuf::from(project_root),
    }
}

fn wrong_scope_summary() -> ScanSummary {
    let mut summary = ScanSummary::skipped(SkipReason::WrongBuildScope);
    summary.log_line(WRONG_SCOPE_MESSAGE);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildScope, ReplacementStatus};
    use crate::services::host::{HostError, MockHost};

    fn paths(files: &[&str]) -> Vec<Utf8PathBuf> {
        files.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn test_job_for_places_dest_next_to_source() {
        let variant = crate::services::matcher::classify("App.Debug.config").unwrap();
        let job = job_for(Utf8Path::new("/p/sub/App.Debug.config"), &variant, Utf8Path::new("/p"));
        assert_eq!(job.dest, Utf8PathBuf::from("/p/sub/App.config"));
        assert_eq!(job.project_root, Utf8PathBuf::from("/p"));
    }

    #[test]
    fn test_wrong_scope_touches_nothing() {
        let mut host = MockHost::new();
        host.expect_build_scope().return_const(BuildScope::Solution);
        host.expect_enumerate_files().never();
        host.expect_active_configuration().never();

        let orchestrator = Orchestrator::new(host, ExclusionSet::default());
        let summary = orchestrator.build_begin(Utf8Path::new("/p")).unwrap();

        assert_eq!(summary.status, ScanStatus::Skipped(SkipReason::WrongBuildScope));
        assert_eq!(summary.total_scanned, 0);
        assert_eq!(summary.log, vec![WRONG_SCOPE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_enumeration_failure_is_fatal() {
        let mut host = MockHost::new();
        host.expect_build_scope().return_const(BuildScope::Project);
        host.expect_enumerate_files()
            .returning(|_| Err(HostError::Unavailable("no project".to_string())));

        let orchestrator = Orchestrator::new(host, ExclusionSet::default());
        let result = orchestrator.on_build_begin(Utf8Path::new("/p"), "Debug");
        assert!(matches!(result, Err(ReplacerError::HostUnavailable(_))));
    }

    #[test]
    fn test_per_file_failure_does_not_abort_batch() {
        let mut host = MockHost::new();
        host.expect_build_scope().return_const(BuildScope::Project);
        host.expect_enumerate_files()
            .returning(|_| Ok(paths(&["/p/A.Debug.config", "/p/B.Debug.config"])));
        host.expect_exists()
            .returning(|path| path.as_str() != "/p/A.Debug.config");
        host.expect_can_resolve().return_const(true);
        host.expect_is_text_editable().return_const(true);
        host.expect_is_open().return_const(true);
        host.expect_read_effective_content()
            .returning(|_| Ok("b".to_string()));
        host.expect_write_effective_content()
            .withf(|path, _| path.as_str() == "/p/B.config")
            .times(1)
            .returning(|_, _| Ok(()));

        let orchestrator = Orchestrator::new(host, ExclusionSet::default());
        let summary = orchestrator.on_build_begin(Utf8Path::new("/p"), "debug").unwrap();

        assert_eq!(summary.replaced_count, 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(summary.log.iter().any(|l| l.starts_with("Failed to replace /p/A.config")));
        assert_eq!(summary.log.last().unwrap(), "1 file(s) replaced");
    }

    #[test]
    fn test_cancelled_scan_stops_between_files() {
        let mut host = MockHost::new();
        host.expect_build_scope().return_const(BuildScope::Project);
        host.expect_enumerate_files()
            .returning(|_| Ok(paths(&["/p/A.Debug.config"])));
        host.expect_exists().never();

        let cancel = CancellationFlag::new();
        cancel.cancel();
        let orchestrator =
            Orchestrator::new(host, ExclusionSet::default()).with_cancellation(cancel);
        let summary = orchestrator.on_build_begin(Utf8Path::new("/p"), "Debug").unwrap();

        assert_eq!(summary.status, ScanStatus::Cancelled);
        assert_eq!(summary.replaced_count, 0);
        assert_eq!(summary.log.last().unwrap(), "0 file(s) replaced");
    }

    #[test]
    fn test_saved_failure_stays_out_of_log_stream() {
        let mut host = MockHost::new();
        host.expect_exists().return_const(false);

        let orchestrator = Orchestrator::new(host, ExclusionSet::default());
        let summary = orchestrator
            .on_file_saved(Utf8Path::new("/p/App.Debug.config"), "Debug", Utf8Path::new("/p"))
            .unwrap();

        assert!(summary.log.is_empty());
        assert_eq!(summary.failed_count(), 1);
    }

    #[test]
    fn test_saved_excluded_file_is_silent() {
        let mut host = MockHost::new();
        host.expect_exists().never();

        let orchestrator = Orchestrator::new(host, ExclusionSet::new(["Web.config"]));
        let summary = orchestrator
            .on_file_saved(Utf8Path::new("/p/Web.Debug.config"), "Debug", Utf8Path::new("/p"))
            .unwrap();

        assert!(summary.log.is_empty());
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].status, ReplacementStatus::Skipped);
    }

    #[test]
    fn test_document_saved_swallows_missing_configuration() {
        let mut host = MockHost::new();
        host.expect_active_configuration()
            .returning(|_| Err(HostError::Unavailable("no configuration".to_string())));

        let orchestrator = Orchestrator::new(host, ExclusionSet::default());
        let result =
            orchestrator.document_saved(Utf8Path::new("/p/App.Debug.config"), Utf8Path::new("/p"));
        assert!(result.is_none());
    }

    #[test]
    fn test_cancellation_flag_reset() {
        let flag = CancellationFlag::new();
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
        flag.reset();
        assert!(!shared.is_cancelled());
    }
}
