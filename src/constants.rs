//! Global constants used throughout the Spiral codebase.
//!
//! This module contains the default paths, the fixed strings baked into every
//! generated package, and the timeout/retry parameters for version lookups.
//! Defining them centrally keeps the defaults of [`crate::config::GeneratorConfig`]
//! and the behaviour of the core modules in one place.

use std::time::Duration;

/// Version used for packages that carry no version information.
///
/// The value sorts after any real release and marks the package as tracking
/// its VCS head, so the cache treats it as "always current".
pub const UNVERSIONED: &str = "9999";

/// Repology repository used for the exact-match short-circuit when a
/// descriptor does not name one.
pub const DEFAULT_DISTRO: &str = "debian_testing";

/// Repology status value marking the newest known upstream version.
pub const NEWEST_STATUS: &str = "newest";

/// Sentinel distro that opts into the "newest" fallback under
/// [`crate::version::FallbackPolicy::LatestOnly`].
pub const LATEST_DISTRO: &str = "latest";

/// Fixed description prefix written into every generated package.
pub const DESCRIPTION_NOTICE: &str = "Empty package for Debiantai compatibility";

/// Default location of the descriptor tree.
pub const DEFAULT_SOURCES_DIR: &str = "repo/packages";

/// Default location of the template tree.
pub const DEFAULT_TEMPLATE_DIR: &str = "template";

/// Default output root for the generated autobuild tree.
pub const DEFAULT_OUTPUT_DIR: &str = "TREE";

/// Default category directory under the output root.
pub const DEFAULT_CATEGORY: &str = "extra-spiral";

/// Default version cache file.
pub const DEFAULT_CACHE_FILE: &str = "versions.json";

/// Default Repology project API endpoint; the project key is appended.
pub const DEFAULT_REPOLOGY_ENDPOINT: &str = "https://repology.org/api/v1/project/";

/// Project-local configuration file picked up when present.
pub const DEFAULT_CONFIG_FILE: &str = "spiral.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "SPIRAL_CONFIG";

/// Environment variable that hides progress bars when set.
pub const NO_PROGRESS_ENV_VAR: &str = "SPIRAL_NO_PROGRESS";

/// Timeout for a single remote version lookup (30 seconds).
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of times the HTTP transport retries a transient lookup failure.
pub const DEFAULT_LOOKUP_RETRIES: usize = 2;

/// Starting delay for exponential backoff between lookup retries (200ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 200;

/// Maximum backoff delay between lookup retries (2s).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2_000;

/// Default number of concurrent version lookups.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// User agent sent with every lookup request.
///
/// Repology asks API clients to identify themselves.
pub const USER_AGENT: &str = concat!("spiral/", env!("CARGO_PKG_VERSION"));
