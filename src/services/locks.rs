// Per-project-root mutual exclusion
//
// A save-triggered replacement and a build scan over the same project must not
// race on the same destination files. RootLocks serializes them while leaving
// unrelated project roots free to run in parallel.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Registry of project roots currently being processed
#[derive(Debug, Default, Clone)]
pub struct RootLocks {
    inner: Arc<LockTable>,
}

#[derive(Debug, Default)]
struct LockTable {
    busy: Mutex<HashSet<Utf8PathBuf>>,
    released: Condvar,
}

/// Held while a root is being processed; releases the root on drop
#[must_use = "the root is unlocked as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RootGuard {
    table: Arc<LockTable>,
    root: Utf8PathBuf,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `root` is free, then claim it
    pub fn acquire(&self, root: &Utf8Path) -> RootGuard {
        let mut busy = self.inner.busy.lock().unwrap_or_else(PoisonError::into_inner);
        while busy.contains(root) {
            tracing::debug!("Waiting for {} to be released", root);
            busy = self
                .inner
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(root.to_path_buf());

        RootGuard {
            table: Arc::clone(&self.inner),
            root: root.to_path_buf(),
        }
    }

    /// Claim `root` only if nobody holds it
    pub fn try_acquire(&self, root: &Utf8Path) -> Option<RootGuard> {
        let mut busy = self.inner.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(root.to_path_buf()) {
            return None;
        }

        Some(RootGuard {
            table: Arc::clone(&self.inner),
            root: root.to_path_buf(),
        })
    }

    pub fn is_locked(&self, root: &Utf8Path) -> bool {
        self.inner
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(root)
    }
}

impl RootGuard {
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl Drop for RootGuard {
    fn drop(&mut self) {
        let mut busy = self.table.busy.lock().unwrap_or_else(PoisonError::into_inner);
        busy.remove(&self.root);
        self.table.released.notify_all();
    }
}
