//! Integration tests for the replacement pipeline over a real directory tree
//!
//! These tests verify:
//! - Build scans replace exactly the variants matching the active configuration
//! - Exclusions, solution scope and unknown configurations touch nothing
//! - Unsaved editor buffers are what gets copied, and open-document state is preserved
//! - Binary variants are byte-copied
//! - Save-triggered replacement
//! - Concurrent scans over the same root

use camino::{Utf8Path, Utf8PathBuf};
use file_replacer::models::{BuildScope, ReplacementStatus, ScanStatus, SkipReason};
use file_replacer::services::{ExclusionSet, FsHost, Host, Orchestrator, WRONG_SCOPE_MESSAGE};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const WEB_CONFIG: &str = "<configuration><web/></configuration>";
const DEBUG_CONFIG: &str = "<configuration><debug/></configuration>";
const RELEASE_CONFIG: &str = "<configuration><release/></configuration>";

fn create_project() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

    fs::write(root.join("App.Debug.config"), DEBUG_CONFIG).unwrap();
    fs::write(root.join("App.Release.config"), RELEASE_CONFIG).unwrap();
    fs::write(root.join("Web.config"), WEB_CONFIG).unwrap();

    (temp_dir, root)
}

fn orchestrator(configuration: &str) -> Orchestrator<FsHost> {
    let host = FsHost::new().with_configuration(configuration);
    Orchestrator::new(host, ExclusionSet::new(["Web.config"]))
}

fn snapshot(root: &Utf8Path) -> Vec<(Utf8PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = FsHost::new()
        .enumerate_files(root)
        .unwrap()
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).unwrap();
            (path, bytes)
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_build_replaces_matching_variant() {
    let (_temp_dir, root) = create_project();
    let orchestrator = orchestrator("Debug");

    let summary = orchestrator.build_begin(&root).unwrap();

    assert_eq!(summary.status, ScanStatus::Completed);
    assert_eq!(summary.replaced_count, 1);
    assert_eq!(summary.total_scanned, 3);
    assert_eq!(
        fs::read_to_string(root.join("App.config")).unwrap(),
        DEBUG_CONFIG
    );
    assert_eq!(fs::read_to_string(root.join("Web.config")).unwrap(), WEB_CONFIG);

    assert_eq!(summary.log.first().unwrap(), "Replacing files...");
    assert!(summary.log.contains(&format!(
        "Replacing {} with {}",
        root.join("App.config"),
        root.join("App.Debug.config")
    )));
    assert_eq!(summary.log.last().unwrap(), "1 file(s) replaced");
}

#[test]
fn test_configuration_match_ignores_case() {
    let (_temp_dir, root) = create_project();
    let summary = orchestrator("release").build_begin(&root).unwrap();

    assert_eq!(summary.replaced_count, 1);
    assert_eq!(
        fs::read_to_string(root.join("App.config")).unwrap(),
        RELEASE_CONFIG
    );
}

#[test]
fn test_excluded_variants_are_logged_and_skipped() {
    let (_temp_dir, root) = create_project();
    fs::write(root.join("Web.Debug.config"), "<web debug/>").unwrap();
    fs::write(root.join("web.Release.CONFIG"), "<web release/>").unwrap();

    let summary = orchestrator("Debug").build_begin(&root).unwrap();

    assert_eq!(summary.replaced_count, 1);
    assert_eq!(summary.skipped_count(), 2);
    assert_eq!(fs::read_to_string(root.join("Web.config")).unwrap(), WEB_CONFIG);
    assert!(summary.log.contains(&format!(
        "File {} was excluded",
        root.join("Web.Debug.config")
    )));
    assert!(summary.log.contains(&format!(
        "File {} was excluded",
        root.join("web.Release.CONFIG")
    )));
}

#[test]
fn test_unknown_configuration_touches_nothing() {
    let (_temp_dir, root) = create_project();
    let before = snapshot(&root);

    let summary = orchestrator("Staging").build_begin(&root).unwrap();

    assert_eq!(summary.status, ScanStatus::Completed);
    assert_eq!(summary.replaced_count, 0);
    assert!(!summary.has_failures());
    assert_eq!(snapshot(&root), before);
    assert_eq!(summary.log.last().unwrap(), "0 file(s) replaced");
}

#[test]
fn test_solution_scope_is_refused() {
    let (_temp_dir, root) = create_project();
    let before = snapshot(&root);

    let host = FsHost::new()
        .with_configuration("Debug")
        .with_scope(BuildScope::Solution);
    let orchestrator = Orchestrator::new(host, ExclusionSet::new(["Web.config"]));
    let summary = orchestrator.build_begin(&root).unwrap();

    assert_eq!(summary.status, ScanStatus::Skipped(SkipReason::WrongBuildScope));
    assert_eq!(summary.total_scanned, 0);
    assert_eq!(summary.log, vec![WRONG_SCOPE_MESSAGE.to_string()]);
    assert_eq!(snapshot(&root), before);
}

#[test]
fn test_build_is_idempotent() {
    let (_temp_dir, root) = create_project();
    let orchestrator = orchestrator("Debug");

    orchestrator.build_begin(&root).unwrap();
    let first = snapshot(&root);
    let summary = orchestrator.build_begin(&root).unwrap();
    let second = snapshot(&root);

    assert_eq!(summary.replaced_count, 1);
    assert_eq!(first, second);
}

#[test]
fn test_nested_directories_replace_in_place() {
    let (_temp_dir, root) = create_project();
    fs::create_dir_all(root.join("config/env")).unwrap();
    fs::write(root.join("config/env/settings.Debug.json"), "{\"debug\":true}").unwrap();
    fs::write(root.join("config/env/settings.Release.json"), "{\"debug\":false}").unwrap();

    let summary = orchestrator("Debug").build_begin(&root).unwrap();

    assert_eq!(summary.replaced_count, 2);
    assert_eq!(
        fs::read_to_string(root.join("config/env/settings.json")).unwrap(),
        "{\"debug\":true}"
    );
    assert!(!root.join("settings.json").exists());
}

#[test]
fn test_greedy_base_name_keeps_inner_dots() {
    let (_temp_dir, root) = create_project();
    fs::write(root.join("appsettings.local.Debug.json"), "{}").unwrap();

    orchestrator("Debug").build_begin(&root).unwrap();

    assert!(root.join("appsettings.local.json").exists());
}

#[test]
fn test_unsaved_source_buffer_is_copied() {
    let (_temp_dir, root) = create_project();
    let source = root.join("App.Debug.config");

    let orchestrator = orchestrator("Debug");
    orchestrator.host().edit_buffer(&source, "<configuration><unsaved/></configuration>");

    orchestrator.build_begin(&root).unwrap();

    assert_eq!(
        fs::read_to_string(root.join("App.config")).unwrap(),
        "<configuration><unsaved/></configuration>"
    );
    // The source stays open with its edits, and its file on disk is untouched
    assert!(orchestrator.host().is_dirty(&source));
    assert_eq!(fs::read_to_string(&source).unwrap(), DEBUG_CONFIG);
    assert_eq!(orchestrator.host().open_documents(), vec![source]);
}

#[test]
fn test_transient_documents_are_closed() {
    let (_temp_dir, root) = create_project();
    let orchestrator = orchestrator("Debug");

    orchestrator.build_begin(&root).unwrap();

    assert!(orchestrator.host().open_documents().is_empty());
}

#[test]
fn test_open_destination_buffer_is_refreshed() {
    let (_temp_dir, root) = create_project();
    let dest = root.join("App.config");
    fs::write(&dest, "old").unwrap();

    let orchestrator = orchestrator("Debug");
    orchestrator.host().open_document(&dest).unwrap();
    orchestrator.build_begin(&root).unwrap();

    assert_eq!(
        orchestrator.host().read_effective_content(&dest).unwrap(),
        DEBUG_CONFIG
    );
    assert!(!orchestrator.host().is_dirty(&dest));
}

#[test]
fn test_binary_variant_is_byte_copied() {
    let (_temp_dir, root) = create_project();
    let png = [0x89u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00];
    fs::write(root.join("logo.Debug.png"), png).unwrap();

    let summary = orchestrator("Debug").build_begin(&root).unwrap();

    assert_eq!(summary.replaced_count, 2);
    assert_eq!(fs::read(root.join("logo.png")).unwrap(), png.to_vec());
    let outcome = summary
        .outcomes
        .iter()
        .find(|o| o.job.dest == root.join("logo.png"))
        .unwrap();
    assert_eq!(outcome.reason, "byte copy");
}

#[test]
fn test_undecodable_source_past_text_check_is_byte_copied() {
    let (_temp_dir, root) = create_project();
    // Latin-1 content whose first non-UTF-8 byte lies beyond the text sniff window
    let mut latin1 = vec![b'a'; 9000];
    latin1.push(0xE9);
    fs::write(root.join("App.Debug.config"), &latin1).unwrap();

    let orchestrator = orchestrator("Debug");
    let summary = orchestrator.build_begin(&root).unwrap();

    assert!(!summary.has_failures());
    assert_eq!(summary.replaced_count, 1);
    assert_eq!(fs::read(root.join("App.config")).unwrap(), latin1);
    assert_eq!(summary.outcomes[0].reason, "byte copy");
    assert!(orchestrator.host().open_documents().is_empty());
}

#[cfg(unix)]
#[test]
fn test_replacement_keeps_canonical_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp_dir, root) = create_project();
    let dest = root.join("App.config");
    fs::write(&dest, "old").unwrap();
    fs::set_permissions(&dest, fs::Permissions::from_mode(0o644)).unwrap();

    orchestrator("Debug").build_begin(&root).unwrap();

    assert_eq!(fs::read_to_string(&dest).unwrap(), DEBUG_CONFIG);
    assert_eq!(fs::metadata(&dest).unwrap().permissions().mode() & 0o777, 0o644);
}

#[test]
fn test_failed_write_does_not_abort_batch() {
    let (_temp_dir, root) = create_project();
    // The canonical name is taken by a directory, so the rename into place fails
    fs::create_dir_all(root.join("settings.json")).unwrap();
    fs::write(root.join("settings.json/keep.txt"), "keep").unwrap();
    fs::write(root.join("settings.Debug.json"), "{}").unwrap();

    let summary = orchestrator("Debug").build_begin(&root).unwrap();

    assert_eq!(summary.status, ScanStatus::Completed);
    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.replaced_count, 1);
    assert_eq!(
        fs::read_to_string(root.join("App.config")).unwrap(),
        DEBUG_CONFIG
    );
    assert!(root.join("settings.json").is_dir());
    assert!(summary.log.iter().any(|line| {
        line.starts_with(&format!("Failed to replace {}", root.join("settings.json")))
    }));
    assert_eq!(summary.log.last().unwrap(), "1 file(s) replaced");
}

#[test]
fn test_open_document_in_removed_directory_is_unresolvable() {
    let (_temp_dir, root) = create_project();
    let source = root.join("removed/App.Debug.config");

    let orchestrator = orchestrator("Debug");
    orchestrator.host().edit_buffer(&source, DEBUG_CONFIG);
    let summary = orchestrator.document_saved(&source, &root).unwrap();

    assert_eq!(summary.failed_count(), 1);
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.status, ReplacementStatus::Failed);
    assert!(outcome.reason.contains("Cannot resolve destination"));
    assert!(!root.join("removed").exists());
    assert!(summary.log.is_empty());
}

#[test]
fn test_missing_project_root_is_fatal() {
    let (_temp_dir, root) = create_project();
    let result = orchestrator("Debug").build_begin(&root.join("missing"));
    assert!(result.is_err());
}

#[test]
fn test_missing_configuration_is_fatal_for_build() {
    let (_temp_dir, root) = create_project();
    let orchestrator = Orchestrator::new(FsHost::new(), ExclusionSet::default());
    assert!(orchestrator.build_begin(&root).is_err());
}

#[test]
fn test_document_saved_replaces_canonical_file() {
    let (_temp_dir, root) = create_project();
    let orchestrator = orchestrator("DEBUG");

    let summary = orchestrator
        .document_saved(&root.join("App.Debug.config"), &root)
        .unwrap();

    assert_eq!(summary.replaced_count, 1);
    assert!(summary.log.is_empty());
    assert_eq!(
        fs::read_to_string(root.join("App.config")).unwrap(),
        DEBUG_CONFIG
    );
}

#[test]
fn test_document_saved_for_other_configuration_does_nothing() {
    let (_temp_dir, root) = create_project();
    let orchestrator = orchestrator("Debug");

    let summary = orchestrator
        .document_saved(&root.join("App.Release.config"), &root)
        .unwrap();

    assert_eq!(summary.replaced_count, 0);
    assert!(summary.outcomes.is_empty());
    assert!(!root.join("App.config").exists());
}

#[test]
fn test_document_saved_non_variant_does_nothing() {
    let (_temp_dir, root) = create_project();
    let summary = orchestrator("Debug")
        .document_saved(&root.join("Web.config"), &root)
        .unwrap();
    assert!(summary.outcomes.is_empty());
}

#[test]
fn test_concurrent_scans_over_same_root() {
    let (_temp_dir, root) = create_project();
    for i in 0..20 {
        fs::write(root.join(format!("file{}.Debug.txt", i)), format!("debug {}", i)).unwrap();
    }

    let orchestrator = Arc::new(orchestrator("Debug"));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            let root = root.clone();
            thread::spawn(move || orchestrator.build_begin(&root).unwrap())
        })
        .collect();

    for handle in handles {
        let summary = handle.join().unwrap();
        assert!(!summary.has_failures());
        assert_eq!(summary.replaced_count, 21);
    }

    for i in 0..20 {
        assert_eq!(
            fs::read_to_string(root.join(format!("file{}.txt", i))).unwrap(),
            format!("debug {}", i)
        );
    }
}

#[test]
fn test_outcomes_cover_every_replacement() {
    let (_temp_dir, root) = create_project();
    let summary = orchestrator("Debug").build_begin(&root).unwrap();

    let replaced: Vec<_> = summary
        .outcomes
        .iter()
        .filter(|o| o.status == ReplacementStatus::Replaced)
        .map(|o| o.job.source.clone())
        .collect();
    assert_eq!(replaced, vec![root.join("App.Debug.config")]);
}
