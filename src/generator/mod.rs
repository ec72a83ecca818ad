//! Tree orchestration
//!
//! [`Generator`] drives a whole run over a sources tree:
//!
//! ```text
//! discover → read + validate → resolve (bounded parallel) → skip check → materialize → record
//! ```
//!
//! Every entry below the sources root (files and directories alike, following symlinks)
//! is a descriptor candidate. A candidate that fails at any step is reported as omitted
//! and the run continues with the next one; only a missing template directory or a
//! failure to take the run lock aborts the run.
//!
//! # Ordering
//!
//! Version lookups are the only network-bound step, so they run concurrently (at most
//! `max_parallel` at a time) while their results are consumed in source order. The skip
//! check, materialization and cache updates then happen strictly sequentially, so no two
//! items ever touch the cache or the output tree at the same time. Candidates are
//! visited in file-name order for reproducible runs.
//!
//! # Cache semantics
//!
//! The version cache is loaded once before the first candidate and persisted once after
//! the last one. With the default [`RecordPolicy::OnResolve`], a package's version is
//! recorded as soon as it resolves, before materialization; [`RecordPolicy::OnSuccess`]
//! records it only after the package directory has been written.

mod report;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{RunLock, VersionCache};
use crate::config::{GeneratorConfig, RecordPolicy};
use crate::core::SpiralError;
use crate::descriptor::{DescriptorFormat, PackageDescriptor, ResolvedPackage, ValidationError, validate_as};
use crate::templating::materialize;
use crate::utils::fs::remove_dir_all;
use crate::utils::progress::ProgressBar;
use crate::version::{VersionLookup, VersionResolver};

pub use report::{ItemOutcome, ItemReport, RunReport, RunSummary, Stage};

/// Per-run switches that are not part of the persistent configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Regenerate every package even when its version matches the cache
    pub force: bool,
    /// Remove the whole category directory before generating
    pub clean: bool,
}

/// Read and validate one descriptor file.
///
/// The format is chosen from the file extension, see [`DescriptorFormat::from_path`].
///
/// # Errors
///
/// [`SpiralError::DescriptorUnreadable`] when the path cannot be read (this includes
/// directories), [`SpiralError::Validation`] when it is not UTF-8 text or does not
/// validate.
pub fn read_descriptor(path: &Path) -> Result<PackageDescriptor, SpiralError> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        // Not UTF-8: the file exists but cannot be parsed as a document
        ErrorKind::InvalidData => SpiralError::from(ValidationError::MalformedInput {
            reason: format!("not valid UTF-8 text: {e}"),
        }),
        _ => SpiralError::DescriptorUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;
    Ok(validate_as(&raw, DescriptorFormat::from_path(path))?)
}

/// Every descriptor candidate below `source_root`, in file-name order.
///
/// A missing sources root yields no candidates. Entries the walk cannot stat (such as
/// dangling symlinks) are still returned so they show up as omitted items.
pub fn discover_candidates(source_root: &Path) -> Vec<PathBuf> {
    if !source_root.is_dir() {
        warn!(target: "generator", "Sources directory {} does not exist", source_root.display());
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for entry in WalkDir::new(source_root).follow_links(true).min_depth(1).sort_by_file_name() {
        match entry {
            Ok(entry) => candidates.push(entry.into_path()),
            Err(e) => match e.path() {
                Some(path) => candidates.push(path.to_path_buf()),
                None => warn!(target: "generator", "Skipping unreadable entry: {}", e),
            },
        }
    }
    candidates
}

/// A candidate after the concurrent part of the pipeline.
enum Resolved {
    Ready(ResolvedPackage),
    Failed {
        name: Option<String>,
        error: SpiralError,
    },
}

/// Drives generation runs over one sources tree.
///
/// # Examples
///
/// ```rust,no_run
/// use spiral_cli::config::GeneratorConfig;
/// use spiral_cli::generator::{Generator, RunOptions};
/// use spiral_cli::version::RepologyClient;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = GeneratorConfig::load(None).await?;
/// let client = RepologyClient::new(&config.repology_endpoint, config.lookup_timeout(), config.lookup_retries)?;
/// let generator = Generator::new(config, client, RunOptions::default())?;
///
/// let report = generator.run().await?;
/// println!("{} packages prepared", report.summary.prepared);
/// # Ok(())
/// # }
/// ```
pub struct Generator<L> {
    config: GeneratorConfig,
    resolver: VersionResolver<L>,
    options: RunOptions,
}

impl<L: VersionLookup> Generator<L> {
    /// Create a generator.
    ///
    /// # Errors
    ///
    /// [`SpiralError::TemplateNotFound`] when the configured template directory does
    /// not exist.
    pub fn new(config: GeneratorConfig, lookup: L, options: RunOptions) -> Result<Self, SpiralError> {
        ensure_template(&config.template)?;
        let resolver = VersionResolver::new(lookup, config.resolver_options());
        Ok(Self {
            config,
            resolver,
            options,
        })
    }

    /// Process every candidate below the sources root and persist the version cache.
    ///
    /// Per-item failures are part of the returned report, never an `Err`.
    ///
    /// # Errors
    ///
    /// Fails if the run lock cannot be taken, the template has disappeared, the
    /// category directory cannot be cleaned, or the cache cannot be written.
    pub async fn run(&self) -> Result<RunReport> {
        let cache_path = &self.config.cache;
        let _lock = RunLock::acquire(cache_path).await?;
        ensure_template(&self.config.template)?;

        let category_dir = self.config.category_dir();
        if self.options.clean {
            info!(target: "generator", "Cleaning {}", category_dir.display());
            remove_dir_all(&category_dir)
                .with_context(|| format!("Failed to clean {}", category_dir.display()))?;
        }

        let mut cache = VersionCache::load(cache_path);
        info!(target: "generator", ">>> Generation start");

        let candidates = discover_candidates(&self.config.sources);
        debug!(target: "generator", "Found {} descriptor candidates", candidates.len());

        let resolved: Vec<(PathBuf, Resolved)> = stream::iter(candidates)
            .map(|entry| async move {
                let resolved = self.prepare(&entry).await;
                (entry, resolved)
            })
            .buffered(self.config.max_parallel.max(1))
            .collect()
            .await;

        let progress = ProgressBar::new(resolved.len() as u64);
        progress.set_prefix("Generating");

        let mut report = RunReport::default();
        for (entry, resolved) in resolved {
            let item = match resolved {
                Resolved::Ready(package) => {
                    progress.set_message(package.name.clone());
                    self.process(entry, &package, &category_dir, &mut cache)
                }
                Resolved::Failed {
                    name,
                    error,
                } => ItemReport::omitted(entry, name, None, &error),
            };
            progress.suspend(|| log_item(&item));
            report.push(item);
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(target: "generator", ">>> Generation finished");
        info!(target: "generator", ">>> Saving version log...");
        cache.persist(cache_path)?;

        let summary = report.summary;
        info!(
            target: "generator",
            "{} prepared, {} skipped, {} omitted",
            summary.prepared, summary.skipped, summary.omitted
        );
        Ok(report)
    }

    /// Read, validate and resolve one candidate.
    async fn prepare(&self, entry: &Path) -> Resolved {
        let descriptor = match read_descriptor(entry) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                return Resolved::Failed {
                    name: None,
                    error,
                };
            }
        };

        match self.resolver.resolve(&descriptor.version_spec()).await {
            Ok(version) => Resolved::Ready(ResolvedPackage::new(&descriptor, version)),
            Err(e) => Resolved::Failed {
                name: Some(descriptor.name),
                error: e.into(),
            },
        }
    }

    /// Skip check, materialization and cache update for one resolved package.
    fn process(
        &self,
        entry: PathBuf,
        package: &ResolvedPackage,
        category_dir: &Path,
        cache: &mut VersionCache,
    ) -> ItemReport {
        let name = package.name.as_str();
        let version = package.version.as_str();

        if !self.options.force && cache.should_skip(name, version) {
            return ItemReport::skipped(entry, name, version);
        }

        if self.config.record_policy == RecordPolicy::OnResolve {
            cache.record(name, version);
        }

        let output_path = category_dir.join(name);
        if let Err(e) = materialize(&self.config.template, &output_path, &package.variables()) {
            let error = SpiralError::from(e);
            return ItemReport::omitted(entry, Some(name.to_string()), Some(version.to_string()), &error);
        }

        if self.config.record_policy == RecordPolicy::OnSuccess {
            cache.record(name, version);
        }
        ItemReport::prepared(entry, name, version)
    }
}

fn ensure_template(template: &Path) -> Result<(), SpiralError> {
    if template.is_dir() {
        Ok(())
    } else {
        Err(SpiralError::TemplateNotFound {
            path: template.display().to_string(),
        })
    }
}

fn log_item(item: &ItemReport) {
    match item.outcome {
        ItemOutcome::Prepared => info!(target: "generator", "{}: prepared", item.entry.display()),
        ItemOutcome::Skipped => info!(
            target: "generator",
            "{}: no updates found, ignoring...",
            item.name.as_deref().unwrap_or_default()
        ),
        ItemOutcome::Omitted => warn!(
            target: "generator",
            "{}: omitted, {}",
            item.entry.display(),
            item.reason.as_deref().unwrap_or_default()
        ),
    }
}
