//! Incremental version cache
//!
//! The version cache remembers, per package name, the last version that was resolved for
//! it. It is the only incrementality mechanism Spiral has: when a package resolves to the
//! exact string stored here, materialization is skipped for the whole package.
//!
//! # Lifecycle
//!
//! 1. [`VersionCache::load`] once at the start of a run. A missing, unreadable or corrupt
//!    file yields an empty cache; the run never fails because of it.
//! 2. [`VersionCache::should_skip`] / [`VersionCache::record`] while processing packages.
//! 3. [`VersionCache::persist`] once after every package has been processed.
//!
//! The skip decision looks at the cache only, never at the output tree, so deleting a
//! generated package directory does not trigger its regeneration until its upstream
//! version changes (or the entry is removed with `spiral cache remove`).
//!
//! # File format
//!
//! A single JSON object mapping package names to version strings:
//!
//! ```json
//! {
//!   "spiral-libfoo": "1.4.2",
//!   "spiral-tools": "9999"
//! }
//! ```

pub mod lock;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::utils::fs::atomic_write;

pub use lock::RunLock;

/// Persisted mapping of package name to last-resolved version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionCache {
    entries: BTreeMap<String, String>,
}

impl VersionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `path`, treating every failure as an empty cache.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(target: "cache", "No version log at {}, starting empty", path.display());
            return Self::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(target: "cache", "Cannot read version log {}: {}, ignoring...", path.display(), e);
                return Self::new();
            }
        };

        if content.trim().is_empty() {
            return Self::new();
        }

        match serde_json::from_str::<Self>(&content) {
            Ok(cache) => {
                debug!(target: "cache", "Loaded {} version entries from {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                error!(target: "cache", "Invalid version log {}: {}, ignoring...", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the whole cache to `path` atomically.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize version log")?;
        content.push('\n');
        atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to save version log to {}", path.display()))
    }

    /// Whether `name` was last recorded with exactly `version`.
    #[must_use]
    pub fn should_skip(&self, name: &str, version: &str) -> bool {
        self.entries.get(name).is_some_and(|recorded| recorded == version)
    }

    /// Insert or overwrite the entry for `name`, returning the previous version.
    pub fn record(&mut self, name: impl Into<String>, version: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), version.into())
    }

    /// The recorded version for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Drop the entry for `name`, forcing its regeneration on the next run.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, version)| (name.as_str(), version.as_str()))
    }
}
