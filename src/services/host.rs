//! Host capabilities consumed by the replacement pipeline.
//!
//! The [`Host`] trait is everything the engine and orchestrator need from their
//! environment: file enumeration, the active build configuration and scope, and
//! buffer-aware reads and writes. [`FsHost`] implements it on the local filesystem
//! with an in-memory document table standing in for editor buffers.

use crate::models::BuildScope;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::sync::{PoisonError, RwLock};
use tempfile::Builder;
use thiserror::Error;
use walkdir::WalkDir;

/// Number of leading bytes inspected when deciding if a file is text
const TEXT_SNIFF_LEN: usize = 8 * 1024;

/// Errors reported by a [`Host`]
#[derive(Error, Debug)]
pub enum HostError {
    #[error("{0} not found")]
    NotFound(Utf8PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not valid UTF-8 text")]
    NotUtf8(Utf8PathBuf),

    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            HostError::NotFound(path.to_path_buf())
        } else {
            HostError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Environment the replacement pipeline runs in.
///
/// An IDE adapter maps these onto its document and project services; the CLI
/// uses [`FsHost`].
#[cfg_attr(test, mockall::automock)]
pub trait Host {
    /// Scope of the build that triggered the scan
    fn build_scope(&self) -> BuildScope;

    /// Name of the active build configuration for a project
    fn active_configuration(&self, project_root: &Utf8Path) -> Result<String, HostError>;

    /// Every file below `root`, at any depth
    fn enumerate_files(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, HostError>;

    fn exists(&self, path: &Utf8Path) -> bool;

    /// Whether the host can locate or create an item at `path`
    fn can_resolve(&self, path: &Utf8Path) -> bool;

    /// Whether `path` can be handled as a text document
    fn is_text_editable(&self, path: &Utf8Path) -> bool;

    fn is_open(&self, path: &Utf8Path) -> bool;

    fn open_document(&self, path: &Utf8Path) -> Result<(), HostError>;

    fn close_document(&self, path: &Utf8Path) -> Result<(), HostError>;

    /// Current text of `path`, preferring an open edited buffer over disk
    fn read_effective_content(&self, path: &Utf8Path) -> Result<String, HostError>;

    /// Replace the whole content of `path` and persist it through the host's save path
    fn write_effective_content(&self, path: &Utf8Path, content: &str) -> Result<(), HostError>;

    /// Raw byte copy, overwriting `dest`
    fn copy_bytes(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<(), HostError>;
}

/// An open document: loaded text plus any unsaved edits
#[derive(Debug, Clone)]
struct Document {
    text: String,
    dirty: bool,
}

/// Filesystem-backed [`Host`].
///
/// Open documents live in memory. Reads of an open document return its buffer,
/// including unsaved edits. Writes go to disk atomically (temp file in the same
/// directory, fsync, rename) and refresh the buffer of an open destination.
#[derive(Debug, Default)]
pub struct FsHost {
    scope: BuildScope,
    configuration: Option<String>,
    documents: RwLock<HashMap<Utf8PathBuf, Document>>,
}

impl FsHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: BuildScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    /// Record unsaved edits for `path`, opening it if needed
    pub fn edit_buffer(&self, path: &Utf8Path, text: impl Into<String>) {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.insert(
            path.to_path_buf(),
            Document {
                text: text.into(),
                dirty: true,
            },
        );
    }

    /// Whether an open document has edits not yet on disk
    pub fn is_dirty(&self, path: &Utf8Path) -> bool {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .is_some_and(|d| d.dirty)
    }

    /// Paths of all open documents
    pub fn open_documents(&self) -> Vec<Utf8PathBuf> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        let mut paths: Vec<_> = documents.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn atomic_write(path: &Utf8Path, content: &[u8]) -> Result<(), HostError> {
        let parent = match path.parent() {
            Some(p) if !p.as_str().is_empty() => p,
            _ => Utf8Path::new("."),
        };

        let mut temp = temp_file_builder()
            .tempfile_in(parent)
            .map_err(|e| HostError::io(path, e))?;
        temp.write_all(content).map_err(|e| HostError::io(path, e))?;

        // The rename replaces the inode, so carry the old file's mode over
        if let Ok(metadata) = fs::metadata(path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| HostError::io(path, e))?;
        }

        temp.as_file().sync_all().map_err(|e| HostError::io(path, e))?;
        temp.persist(path).map_err(|e| HostError::io(path, e.error))?;

        tracing::debug!("Wrote {} bytes to {}", content.len(), path);
        Ok(())
    }
}

impl Host for FsHost {
    fn build_scope(&self) -> BuildScope {
        self.scope
    }

    fn active_configuration(&self, project_root: &Utf8Path) -> Result<String, HostError> {
        self.configuration.clone().ok_or_else(|| {
            HostError::Unavailable(format!("no active configuration for {}", project_root))
        })
    }

    fn enumerate_files(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, HostError> {
        if !root.is_dir() {
            return Err(HostError::Unavailable(format!(
                "project root {} is not a directory",
                root
            )));
        }

        let mut files = Vec::new();

        // Symlinks are not followed, so directory cycles cannot occur
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => files.push(path),
                Err(path) => tracing::warn!("Skipping non UTF-8 path: {}", path.display()),
            }
        }

        tracing::debug!("Enumerated {} files under {}", files.len(), root);
        Ok(files)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.is_file() || self.is_open(path)
    }

    fn can_resolve(&self, path: &Utf8Path) -> bool {
        match path.parent() {
            Some(parent) if parent.as_str().is_empty() => true,
            Some(parent) => parent.is_dir(),
            None => false,
        }
    }

    fn is_text_editable(&self, path: &Utf8Path) -> bool {
        if self.is_open(path) {
            return true;
        }

        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
            Err(e) => {
                tracing::debug!("Cannot inspect {}: {}", path, e);
                return false;
            }
        };

        let mut head = Vec::with_capacity(TEXT_SNIFF_LEN);
        if let Err(e) = file.take(TEXT_SNIFF_LEN as u64).read_to_end(&mut head) {
            tracing::debug!("Cannot inspect {}: {}", path, e);
            return false;
        }

        looks_like_text(&head)
    }

    fn is_open(&self, path: &Utf8Path) -> bool {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    fn open_document(&self, path: &Utf8Path) -> Result<(), HostError> {
        if self.is_open(path) {
            return Ok(());
        }

        let bytes = fs::read(path).map_err(|e| HostError::io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|_| HostError::NotUtf8(path.to_path_buf()))?;

        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.insert(path.to_path_buf(), Document { text, dirty: false });
        tracing::debug!("Opened {}", path);
        Ok(())
    }

    fn close_document(&self, path: &Utf8Path) -> Result<(), HostError> {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        match documents.remove(path) {
            Some(_) => {
                tracing::debug!("Closed {}", path);
                Ok(())
            }
            None => Err(HostError::NotFound(path.to_path_buf())),
        }
    }

    fn read_effective_content(&self, path: &Utf8Path) -> Result<String, HostError> {
        if let Some(doc) = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(doc.text.clone());
        }

        let bytes = fs::read(path).map_err(|e| HostError::io(path, e))?;
        String::from_utf8(bytes).map_err(|_| HostError::NotUtf8(path.to_path_buf()))
    }

    fn write_effective_content(&self, path: &Utf8Path, content: &str) -> Result<(), HostError> {
        Self::atomic_write(path, content.as_bytes())?;

        // The open buffer now matches disk, so it is not "externally modified"
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(doc) = documents.get_mut(path) {
            doc.text = content.to_string();
            doc.dirty = false;
        }
        Ok(())
    }

    fn copy_bytes(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<(), HostError> {
        let bytes = fs::read(source).map_err(|e| HostError::io(source, e))?;
        Self::atomic_write(dest, &bytes)?;

        // A binary destination cannot be open as text; drop any stale buffer
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.remove(dest);
        Ok(())
    }
}

/// Temp files default to 0600; new destinations get 0666 less the umask instead
#[cfg(unix)]
fn temp_file_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_file_builder() -> Builder<'static, 'static> {
    Builder::new()
}

/// No NUL bytes and valid UTF-8, tolerating a sequence cut off at the end
fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }

    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
