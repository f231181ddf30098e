//! Advisory lock files guarding single-writer catalog mutations.
//!
//! A catalog directory may be mutated (`push`, `yank`) by one writer at a time.
//! The lock is a file created with `create_new`, so a second writer fails
//! immediately instead of interleaving with the first. The file is removed
//! when the guard is dropped.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::{ToteError, ToteResult};

/// Lock file name placed inside a locked directory.
pub const LOCK_FILE_NAME: &str = ".tote.lock";

/// Held advisory lock on a directory. Released on drop.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Acquire the lock for `dir`, failing with [`ToteError::CatalogLocked`]
    /// if another writer already holds it.
    pub fn acquire(dir: &Path) -> ToteResult<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ToteError::CatalogLocked { path });
            }
            Err(e) => return Err(ToteError::Io(e)),
        };
        // Owner pid helps identify stale locks by hand.
        let _ = writeln!(file, "{}", std::process::id());
        tracing::debug!("acquired catalog lock {}", path.display());
        Ok(Self { path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to release lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_writer_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let first = DirLock::acquire(tmp.path()).unwrap();
        let second = DirLock::acquire(tmp.path());
        assert!(matches!(second, Err(ToteError::CatalogLocked { .. })));
        drop(first);
        assert!(DirLock::acquire(tmp.path()).is_ok());
    }

    #[test]
    fn lock_file_removed_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let lock_path = {
            let lock = DirLock::acquire(tmp.path()).unwrap();
            assert!(lock.path().is_file());
            lock.path().to_path_buf()
        };
        assert!(!lock_path.exists());
    }
}
