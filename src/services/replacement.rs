use crate::models::{ReplacementJob, ReplacementOutcome};
use crate::services::host::{Host, HostError};
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Errors that abort a single replacement
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source file {0} not found")]
    SourceNotFound(Utf8PathBuf),

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: Utf8PathBuf,
        #[source]
        source: HostError,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: HostError,
    },

    #[error("Cannot resolve destination {0}")]
    DestNotResolvable(Utf8PathBuf),

    #[error("Host unavailable: {0}")]
    HostUnavailable(String),
}

impl EngineError {
    /// Whether the whole invocation must stop, not just this file
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::HostUnavailable(_))
    }

    fn write_failed(path: &Utf8Path, source: HostError) -> Self {
        match source {
            HostError::Unavailable(reason) => EngineError::HostUnavailable(reason),
            source => EngineError::WriteFailed {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    fn read_failed(path: &Utf8Path, source: HostError) -> Self {
        match source {
            HostError::NotFound(_) => EngineError::SourceNotFound(path.to_path_buf()),
            HostError::Unavailable(reason) => EngineError::HostUnavailable(reason),
            source => EngineError::ReadFailed {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Copies a variant's content over its canonical file.
///
/// Text files are replaced as a whole buffer through the host, so an editor holding the
/// destination sees a normal save instead of an external modification, and unsaved edits
/// in the source are what gets copied. Anything the host cannot treat as text is copied
/// byte for byte.
///
/// The engine leaves the host's open-document state as it found it: a source it had to
/// open in order to read is closed again, whether or not the write succeeded.
pub struct ReplacementEngine<'a, H: Host + ?Sized> {
    host: &'a H,
}

impl<'a, H: Host + ?Sized> ReplacementEngine<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Execute one replacement job.
    ///
    /// # Returns
    /// A `Replaced` outcome whose reason is `"text"` or `"byte copy"`. A source that
    /// turns out not to be UTF-8 once opened is byte-copied as well.
    ///
    /// # Errors
    /// - [`EngineError::SourceNotFound`] if the variant vanished
    /// - [`EngineError::DestNotResolvable`] if the host cannot place the canonical file
    /// - [`EngineError::ReadFailed`] if the source could not be opened or read
    /// - [`EngineError::WriteFailed`] if writing the destination failed
    /// - [`EngineError::HostUnavailable`] if the host stopped responding
    pub fn replace(&self, job: ReplacementJob) -> Result<ReplacementOutcome, EngineError> {
        let start = Instant::now();
        let source = job.source.as_path();
        let dest = job.dest.as_path();

        if !self.host.exists(source) {
            return Err(EngineError::SourceNotFound(job.source.clone()));
        }

        if !self.host.can_resolve(dest) {
            return Err(EngineError::DestNotResolvable(job.dest.clone()));
        }

        if !self.host.is_text_editable(source) || !self.host.is_text_editable(dest) {
            tracing::debug!("{} is not text, copying bytes", dest);
            return self.copy_bytes(job, start);
        }

        let opened_here = if self.host.is_open(source) {
            false
        } else {
            match self.host.open_document(source) {
                Ok(()) => true,
                Err(HostError::NotUtf8(_)) => {
                    tracing::debug!("{} cannot be opened as text, copying bytes", source);
                    return self.copy_bytes(job, start);
                }
                Err(e) => return Err(EngineError::read_failed(source, e)),
            }
        };

        let copied_as_text = self.copy_text(source, dest);

        if opened_here {
            if let Err(e) = self.host.close_document(source) {
                tracing::warn!("Failed to close {}: {}", source, e);
            }
        }

        if !copied_as_text? {
            tracing::debug!("{} is not valid text, copying bytes", source);
            return self.copy_bytes(job, start);
        }
        Ok(ReplacementOutcome::replaced(job, "text", start.elapsed()))
    }

    /// Whole-buffer text replace. `Ok(false)` means the source content is not text.
    fn copy_text(&self, source: &Utf8Path, dest: &Utf8Path) -> Result<bool, EngineError> {
        let content = match self.host.read_effective_content(source) {
            Ok(content) => content,
            Err(HostError::NotUtf8(_)) => return Ok(false),
            Err(e) => return Err(EngineError::read_failed(source, e)),
        };

        self.host
            .write_effective_content(dest, &content)
            .map_err(|e| EngineError::write_failed(dest, e))?;
        Ok(true)
    }

    fn copy_bytes(
        &self,
        job: ReplacementJob,
        start: Instant,
    ) -> Result<ReplacementOutcome, EngineError> {
        self.host
            .copy_bytes(&job.source, &job.dest)
            .map_err(|e| EngineError::write_failed(&job.dest, e))?;
        Ok(ReplacementOutcome::replaced(job, "byte copy", start.elapsed()))
    }
}
