//! Process-level run lock.
//!
//! A generation run reads the version cache at the start and rewrites it at the end, and
//! replaces package directories in between. Two runs sharing a cache file would lose each
//! other's updates, so a run holds an exclusive lock on `<cache>.lock` for its whole
//! duration. The lock is released when the [`RunLock`] is dropped.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::utils::fs::ensure_parent_dir;

/// Exclusive lock guarding one version cache file and its output tree.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Path of the lock file guarding `cache_path`.
    #[must_use]
    pub fn lock_path(cache_path: &Path) -> PathBuf {
        let mut name = cache_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        cache_path.with_file_name(name)
    }

    /// Acquire the lock for `cache_path`, waiting for any other run to finish.
    pub async fn acquire(cache_path: &Path) -> Result<Self> {
        let lock_path = Self::lock_path(cache_path);
        ensure_parent_dir(&lock_path)?;

        let lock_path_clone = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path_clone)
                .with_context(|| format!("Failed to open lock file: {}", lock_path_clone.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire lock: {}", lock_path_clone.display()))?;

            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::debug!(target: "cache", "Acquired run lock {}", lock_path.display());

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }

    /// Path of the held lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self._file.unlock() {
            eprintln!("Warning: Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
