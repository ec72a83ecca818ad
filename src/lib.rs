//! Spiral - autobuild tree generator
//!
//! Spiral turns a directory of small package descriptors into an autobuild package tree.
//! Every descriptor names a package, its dependencies, and where its version comes from;
//! Spiral resolves the version, copies a template directory for the package and fills
//! in the template's `@KEY@` placeholders. A version cache remembers what each package
//! was last generated with, so unchanged packages are skipped on the next run.
//!
//! # Architecture Overview
//!
//! ```text
//! sources tree ──► descriptor ──► version ──► cache check ──► templating ──► TREE/<category>/<name>
//!                  (validate)    (resolve)   (skip?)         (materialize)
//! ```
//!
//! The [`generator`] module drives the pipeline for every descriptor; a failure in one
//! package is reported and the run moves on to the next.
//!
//! # Core Modules
//!
//! - [`descriptor`] - parsing and validation of package descriptors (JSON, YAML, TOML)
//! - [`version`] - version resolution: static, Repology lookup, or unversioned
//! - [`cache`] - the persisted name → version cache and the run lock
//! - [`templating`] - template copy and placeholder substitution
//! - [`generator`] - the per-run orchestration and its report
//!
//! # Supporting Modules
//!
//! - [`cli`] - the `spiral` command-line interface
//! - [`config`] - `spiral.toml` loading and defaults
//! - [`constants`] - default paths and fixed strings
//! - [`core`] - the crate-wide error type and user-facing error rendering
//! - [`utils`] - filesystem helpers and progress bars
//!
//! # Descriptor Format
//!
//! ```json
//! {
//!     "name": "spiral-libfoo",
//!     "deps": ["libfoo1", "libfoo-dev"],
//!     "description": "metapackage for libfoo",
//!     "version": { "method": "repology", "repology": "libfoo" },
//!     "PKGSEC": "libs"
//! }
//! ```
//!
//! The template sees `@NAME@`, `@DEPS@` (space-separated), `@DESC@`, `@VER@` and every
//! upper-case extra such as `@PKGSEC@`.
//!
//! # Example
//!
//! ```rust,no_run
//! use spiral_cli::config::GeneratorConfig;
//! use spiral_cli::generator::{Generator, RunOptions};
//! use spiral_cli::version::RepologyClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GeneratorConfig::load(None).await?;
//! let client = RepologyClient::new(&config.repology_endpoint, config.lookup_timeout(), config.lookup_retries)?;
//! let report = Generator::new(config, client, RunOptions::default())?.run().await?;
//!
//! for name in report.names(spiral_cli::generator::ItemOutcome::Prepared) {
//!     println!("generated {name}");
//! }
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod cache;
pub mod descriptor;
pub mod generator;
pub mod templating;
pub mod version;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod utils;

// Test utilities (available for both unit and integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
