//! Repository-wide advisory lock
//!
//! Held around every mutation that spans several files (staging, committing,
//! branching), so two processes cannot interleave "resolve HEAD", "persist
//! commit" and "advance ref" on the same store.

use crate::errors::Result;
use file_guard::{FileGuard, Lock};
use std::fs::File;
use std::path::Path;

/// Name of the lock file inside the store root
pub const LOCK_FILE_NAME: &str = "LOCK";

/// Exclusive lock on `.gitlet/LOCK`, released on drop
#[derive(Debug)]
pub struct RepositoryLock {
    _guard: FileGuard<Box<File>>,
}

impl RepositoryLock {
    /// Block until the lock is acquired
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let guard = file_guard::lock(Box::new(file), Lock::Exclusive, 0, 1)?;
        tracing::debug!(path = %path.display(), "acquired repository lock");

        Ok(RepositoryLock { _guard: guard })
    }
}
