//! Test utilities for Spiral
//!
//! Helpers shared by unit tests and, through the `test-utils` feature, by the
//! integration tests:
//!
//! - [`init_test_logging`] - one-time tracing setup that cooperates with the test harness
//! - [`ScriptedLookup`] - a [`VersionLookup`] that answers from a fixed script and counts
//!   calls, so tests can assert that static descriptors never reach the network
//! - [`TestTree`] - a throwaway working directory with a sources tree, a template and a
//!   config pointing at both
//!
//! # Example
//!
//! ```rust,no_run
//! use spiral_cli::test_utils::{ScriptedLookup, TestTree};
//! use spiral_cli::version::VersionRecord;
//!
//! let tree = TestTree::new().unwrap();
//! tree.add_descriptor("foo.json", r#"{"name": "foo", "deps": []}"#).unwrap();
//!
//! let lookup = ScriptedLookup::new()
//!     .with_records("foo", vec![VersionRecord::new("debian_testing", "1.0", "newest")]);
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::GeneratorConfig;
use crate::version::{VersionLookup, VersionRecord};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `None`, logging is enabled only when
/// `RUST_LOG` is set:
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A scripted [`VersionLookup`].
///
/// Unknown projects answer with an empty record list, which the resolver reports as
/// "no version found".
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    responses: HashMap<String, Result<Vec<VersionRecord>, String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    forbidden: bool,
}

impl ScriptedLookup {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A lookup that panics when used.
    #[must_use]
    pub fn never_called() -> Self {
        Self {
            forbidden: true,
            ..Self::default()
        }
    }

    /// Answer `project` with `records`.
    #[must_use]
    pub fn with_records(mut self, project: &str, records: Vec<VersionRecord>) -> Self {
        self.responses.insert(project.to_string(), Ok(records));
        self
    }

    /// Fail lookups of `project` with `message`.
    #[must_use]
    pub fn with_failure(mut self, project: &str, message: &str) -> Self {
        self.responses.insert(project.to_string(), Err(message.to_string()));
        self
    }

    /// Sleep before answering every lookup.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VersionLookup for ScriptedLookup {
    async fn lookup(&self, project: &str) -> Result<Vec<VersionRecord>> {
        assert!(!self.forbidden, "unexpected version lookup for '{project}'");
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(project) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Ok(Vec::new()),
        }
    }
}

/// Template used by [`TestTree`]: one top-level file and one nested file, both with
/// placeholders.
pub const TEST_TEMPLATE_SPEC: &str = "VER=@VER@\n";
/// Nested template file written by [`TestTree`].
pub const TEST_TEMPLATE_DEFINES: &str =
    "PKGNAME=@NAME@\nPKGDEP=\"@DEPS@\"\nPKGDES=\"@DESC@\"\n";

/// A temporary working directory laid out like a real generator checkout.
///
/// ```text
/// <root>/
///   repo/packages/   descriptors
///   template/        spec + autobuild/defines
///   TREE/            output (created by runs)
///   versions.json    cache (created by runs)
/// ```
pub struct TestTree {
    /// Owns the directory; dropped with the tree
    pub temp_dir: TempDir,
    /// Root of the working directory
    pub root: PathBuf,
}

impl TestTree {
    /// Create the directory with an empty sources tree and the default template.
    pub fn new() -> Result<Self> {
        init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let tree = Self {
            temp_dir,
            root,
        };

        fs::create_dir_all(tree.sources_dir())?;
        fs::create_dir_all(tree.template_dir().join("autobuild"))?;
        fs::write(tree.template_dir().join("spec"), TEST_TEMPLATE_SPEC)?;
        fs::write(tree.template_dir().join("autobuild").join("defines"), TEST_TEMPLATE_DEFINES)?;
        Ok(tree)
    }

    /// Root of the descriptor tree.
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("repo").join("packages")
    }

    /// Template directory.
    pub fn template_dir(&self) -> PathBuf {
        self.root.join("template")
    }

    /// Output root.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("TREE")
    }

    /// Directory a package named `name` is generated into.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.output_dir().join("extra-spiral").join(name)
    }

    /// Version cache file.
    pub fn cache_path(&self) -> PathBuf {
        self.root.join("versions.json")
    }

    /// Write a descriptor at `relative` under the sources tree.
    pub fn add_descriptor(&self, relative: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let path = self.sources_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a file into the template.
    pub fn add_template_file(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<()> {
        let path = self.template_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Read a file of a generated package.
    pub fn read_package_file(&self, name: &str, relative: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(self.package_dir(name).join(relative))?)
    }

    /// Configuration with every path pointing into this tree.
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            sources: self.sources_dir(),
            template: self.template_dir(),
            output: self.output_dir(),
            cache: self.cache_path(),
            ..GeneratorConfig::default()
        }
    }

    /// Write `config` as `spiral.toml` in the root and return its path.
    pub fn write_config(&self, config: &GeneratorConfig) -> Result<PathBuf> {
        let path = self.root.join("spiral.toml");
        fs::write(&path, toml::to_string(config)?)?;
        Ok(path)
    }
}
