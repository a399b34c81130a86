// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive advisory file lock
//!
//! A named lock backed by `<dir>/<name>.lock`. While held, the file contains
//! the owning process id. Useful for callers that need a hard guarantee that
//! only one scheduler runs per host; events do not use it internally.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from lock operations. All of these indicate a programming or
/// environment fault rather than contention.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock '{0}' is already acquired by this handle")]
    AlreadyAcquired(String),
    #[error("lock '{0}' was released without being acquired")]
    NotAcquired(String),
    #[error("failed to open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write lock file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to unlock {path}: {source}")]
    Unlock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A named exclusive lock holding at most one open file handle
#[derive(Debug)]
pub struct Lock {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

impl Lock {
    /// Lock named `name` in the system temp directory
    pub fn new(name: impl Into<String>) -> Self {
        Self::in_dir(std::env::temp_dir(), name)
    }

    /// Lock named `name` in `dir`
    pub fn in_dir(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = dir.as_ref().join(format!("{}.lock", name));
        Self {
            name,
            path,
            file: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_acquired(&self) -> bool {
        self.file.is_some()
    }

    /// Try to take the lock, waiting for it when `blocking` is set.
    ///
    /// Returns `Ok(false)` when another holder has it and `blocking` is off.
    pub fn acquire(&mut self, blocking: bool) -> Result<bool, LockError> {
        if self.file.is_some() {
            return Err(LockError::AlreadyAcquired(self.name.clone()));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|source| LockError::Open {
                path: self.path.clone(),
                source,
            })?;

        let locked = if blocking {
            file.lock_exclusive()
        } else {
            file.try_lock_exclusive()
        };
        if let Err(e) = locked {
            tracing::debug!(lock = %self.name, error = %e, "lock is held elsewhere");
            return Ok(false);
        }

        write_pid(&mut file).map_err(|source| LockError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(lock = %self.name, path = %self.path.display(), "lock acquired");
        self.file = Some(file);
        Ok(true)
    }

    /// Release a previously acquired lock and close its handle
    pub fn release(&mut self) -> Result<(), LockError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| LockError::NotAcquired(self.name.clone()))?;

        file.unlock().map_err(|source| LockError::Unlock {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(lock = %self.name, "lock released");
        Ok(())
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.unlock() {
                tracing::warn!(lock = %self.name, error = %e, "unlock on drop failed");
            }
        }
    }
}

fn write_pid(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
