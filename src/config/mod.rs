//! Generator configuration
//!
//! Spiral runs fine without any configuration file: every setting defaults to the layout
//! the tree has always used (`repo/packages` → `TREE/extra-spiral`, `versions.json`). A
//! `spiral.toml` can override any of them.
//!
//! # Lookup order
//!
//! 1. the path passed with `--config`
//! 2. the path in the `SPIRAL_CONFIG` environment variable
//! 3. `./spiral.toml`, if it exists
//! 4. built-in defaults
//!
//! A file named explicitly (1 or 2) must exist and parse; a broken implicit
//! `./spiral.toml` is an error as well, but its absence is not.
//!
//! # Example
//!
//! ```toml
//! sources = "repo/packages"
//! template = "template"
//! output = "~/build/TREE"
//! category = "extra-spiral"
//! cache = "versions.json"
//!
//! repology_endpoint = "https://repology.org/api/v1/project/"
//! default_distro = "debian_testing"
//! fallback = "newest"          # newest | latest-only | never
//! record_policy = "on-resolve" # on-resolve | on-success
//!
//! lookup_timeout_secs = 30
//! lookup_retries = 2
//! max_parallel = 4
//! ```
//!
//! Relative paths are interpreted against the working directory, and `~` / `$VAR` are
//! expanded after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_CACHE_FILE, DEFAULT_CATEGORY, DEFAULT_CONFIG_FILE, DEFAULT_DISTRO,
    DEFAULT_LOOKUP_RETRIES, DEFAULT_LOOKUP_TIMEOUT, DEFAULT_MAX_PARALLEL, DEFAULT_OUTPUT_DIR,
    DEFAULT_REPOLOGY_ENDPOINT, DEFAULT_SOURCES_DIR, DEFAULT_TEMPLATE_DIR,
};
use crate::core::SpiralError;
use crate::utils::fs::{expand_path, is_safe_component};
use crate::version::{FallbackPolicy, ResolverOptions};

/// When a resolved version is written to the version cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordPolicy {
    /// Record right after resolution, whether or not materialization succeeds
    #[default]
    OnResolve,
    /// Record only once the package directory has been written
    OnSuccess,
}

/// Settings for a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Root of the descriptor tree
    pub sources: PathBuf,
    /// Template directory copied for every package
    pub template: PathBuf,
    /// Root of the generated tree
    pub output: PathBuf,
    /// Subdirectory of `output` that receives the packages
    pub category: String,
    /// Version cache file
    pub cache: PathBuf,
    /// Base URL of the Repology project API
    pub repology_endpoint: String,
    /// Distro used by descriptors that do not name one
    pub default_distro: String,
    /// Whether the "newest" record may replace a missing distro match
    pub fallback: FallbackPolicy,
    /// When resolved versions are recorded
    pub record_policy: RecordPolicy,
    /// Upper bound for one version lookup, retries included
    pub lookup_timeout_secs: u64,
    /// Retries for transient HTTP failures
    pub lookup_retries: usize,
    /// Concurrent version lookups
    pub max_parallel: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sources: PathBuf::from(DEFAULT_SOURCES_DIR),
            template: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            category: DEFAULT_CATEGORY.to_string(),
            cache: PathBuf::from(DEFAULT_CACHE_FILE),
            repology_endpoint: DEFAULT_REPOLOGY_ENDPOINT.to_string(),
            default_distro: DEFAULT_DISTRO.to_string(),
            fallback: FallbackPolicy::default(),
            record_policy: RecordPolicy::default(),
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT.as_secs(),
            lookup_retries: DEFAULT_LOOKUP_RETRIES,
            max_parallel: DEFAULT_MAX_PARALLEL,
        }
    }
}

impl GeneratorConfig {
    /// Load the configuration following the lookup order described in the module docs.
    ///
    /// # Errors
    ///
    /// - [`SpiralError::ConfigFileNotFound`] if an explicitly named file does not exist
    /// - [`SpiralError::ConfigError`] if the file cannot be parsed or holds invalid values
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => Self::load_from(&path).await,
            None => {
                debug!("No configuration file found, using defaults");
                let mut config = Self::default();
                config.expand_paths()?;
                Ok(config)
            }
        }
    }

    /// Find the configuration file to use, if any.
    fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()).map(PathBuf::from));

        if let Some(path) = requested {
            if !path.is_file() {
                return Err(SpiralError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            return Ok(Some(path));
        }

        let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
        Ok(implicit.is_file().then_some(implicit))
    }

    /// Load and validate the configuration at `path`.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| SpiralError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| SpiralError::ConfigError {
            message: format!("invalid {}: {}", path.display(), e),
        })?;
        debug!("Loaded configuration from {}", path.display());

        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), SpiralError> {
        let config_error = |message: String| SpiralError::ConfigError {
            message,
        };

        if !is_safe_component(&self.category) {
            return Err(config_error(format!(
                "category '{}' must be a single directory name",
                self.category
            )));
        }
        if self.max_parallel == 0 {
            return Err(config_error("max_parallel must be at least 1".to_string()));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(config_error("lookup_timeout_secs must be at least 1".to_string()));
        }
        if self.default_distro.is_empty() {
            return Err(config_error("default_distro must not be empty".to_string()));
        }
        if !self.repology_endpoint.starts_with("http://") && !self.repology_endpoint.starts_with("https://") {
            return Err(config_error(format!(
                "repology_endpoint '{}' must be an http(s) URL",
                self.repology_endpoint
            )));
        }
        Ok(())
    }

    /// Expand `~` and environment variables in every path setting.
    pub fn expand_paths(&mut self) -> Result<()> {
        for path in [&mut self.sources, &mut self.template, &mut self.output, &mut self.cache] {
            let expanded = expand_path(&path.to_string_lossy())?;
            *path = expanded;
        }
        Ok(())
    }

    /// Directory that receives the generated packages.
    #[must_use]
    pub fn category_dir(&self) -> PathBuf {
        self.output.join(&self.category)
    }

    /// Timeout for a single version lookup.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Resolver settings derived from this configuration.
    #[must_use]
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            default_distro: self.default_distro.clone(),
            fallback: self.fallback,
            timeout: self.lookup_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_tree_layout() {
        let config = GeneratorConfig::default();
        assert_eq!(config.sources, PathBuf::from("repo/packages"));
        assert_eq!(config.template, PathBuf::from("template"));
        assert_eq!(config.category_dir(), PathBuf::from("TREE").join("extra-spiral"));
        assert_eq!(config.cache, PathBuf::from("versions.json"));
        assert_eq!(config.fallback, FallbackPolicy::Newest);
        assert_eq!(config.record_policy, RecordPolicy::OnResolve);
        assert_eq!(config.max_parallel, 4);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spiral.toml");
        std::fs::write(
            &path,
            "category = \"extra-test\"\nfallback = \"latest-only\"\nrecord_policy = \"on-success\"\nmax_parallel = 1\n",
        )
        .unwrap();

        let config = GeneratorConfig::load_from(&path).await.unwrap();
        assert_eq!(config.category, "extra-test");
        assert_eq!(config.fallback, FallbackPolicy::LatestOnly);
        assert_eq!(config.record_policy, RecordPolicy::OnSuccess);
        assert_eq!(config.max_parallel, 1);
        assert_eq!(config.template, PathBuf::from("template"));
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_and_invalid_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spiral.toml");

        std::fs::write(&path, "fallback = \"sometimes\"\n").unwrap();
        let err = GeneratorConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SpiralError>(), Some(SpiralError::ConfigError { .. })));

        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(GeneratorConfig::load_from(&path).await.is_err());

        std::fs::write(&path, "category = \"../escape\"\n").unwrap();
        assert!(GeneratorConfig::load_from(&path).await.is_err());

        std::fs::write(&path, "max_parallel = 0\n").unwrap();
        assert!(GeneratorConfig::load_from(&path).await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn test_explicit_missing_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");

        let err = GeneratorConfig::load(Some(&missing)).await.unwrap_err();
        let spiral_err = err.downcast_ref::<SpiralError>().unwrap();
        assert!(matches!(spiral_err, SpiralError::ConfigFileNotFound { .. }));
        assert!(spiral_err.is_fatal());
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "default_distro = \"arch\"\n").unwrap();

        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var(CONFIG_ENV_VAR, &path);
        }
        let result = GeneratorConfig::load(None).await;
        unsafe {
            std::env::remove_var(CONFIG_ENV_VAR);
        }

        let config = result.unwrap();
        assert_eq!(config.default_distro, "arch");
        assert_eq!(config.resolver_options().default_distro, "arch");
    }

    #[test]
    #[serial]
    fn test_paths_are_expanded() {
        unsafe {
            std::env::set_var("SPIRAL_TEST_ROOT", "/srv/spiral");
        }
        let mut config = GeneratorConfig {
            output: PathBuf::from("$SPIRAL_TEST_ROOT/TREE"),
            ..GeneratorConfig::default()
        };
        let result = config.expand_paths();
        unsafe {
            std::env::remove_var("SPIRAL_TEST_ROOT");
        }

        result.unwrap();
        assert_eq!(config.output, PathBuf::from("/srv/spiral/TREE"));
    }

    #[test]
    fn test_resolver_options() {
        let config = GeneratorConfig {
            lookup_timeout_secs: 5,
            fallback: FallbackPolicy::Never,
            ..GeneratorConfig::default()
        };
        let options = config.resolver_options();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.fallback, FallbackPolicy::Never);
        assert_eq!(options.default_distro, "debian_testing");
    }
}
