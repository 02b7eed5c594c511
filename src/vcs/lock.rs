/// Advisory lock serializing mutating operations on one repository
///
/// The lock file lives inside the backend metadata directory so it never
/// shows up as an untracked file. The lock is released when the guard drops.
use crate::errors::{RepoError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = "repokit.lock";

#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: File,
}

impl RepoLock {
    pub fn lock_path(git_dir: &Path) -> PathBuf {
        git_dir.join(LOCK_FILE_NAME)
    }

    /// Block until the exclusive lock is held
    pub fn acquire(git_dir: &Path) -> Result<Self> {
        let path = Self::lock_path(git_dir);
        let file = Self::open(&path)?;

        file.lock_exclusive().map_err(|e| {
            RepoError::InvalidState(format!("Failed to lock {}: {}", path.display(), e))
        })?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                RepoError::InvalidState(format!(
                    "Failed to open lock file {}: {}",
                    path.display(),
                    e
                ))
            })
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
