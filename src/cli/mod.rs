//! Command-line interface for Spiral
//!
//! The `spiral` binary exposes the generator and its building blocks as subcommands:
//!
//! - `generate` - run the full pipeline over the sources tree
//! - `validate` - check descriptors without resolving or writing anything
//! - `resolve` - print the version one descriptor resolves to
//! - `cache` - inspect and edit the version cache
//!
//! # Global options
//!
//! - `-v, --verbose` - debug logging
//! - `-q, --quiet` - warnings and errors only, no progress bars
//! - `-c, --config <PATH>` - configuration file (see [`crate::config`])
//! - `--no-progress` - no progress bars
//!
//! `RUST_LOG` always wins over `--verbose` / `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! spiral generate
//! spiral generate --force --output /srv/TREE
//! spiral --quiet generate --format json > report.json
//! spiral validate repo/packages/spiral-libfoo
//! spiral resolve repo/packages/spiral-libfoo
//! spiral cache remove spiral-libfoo
//! ```

pub mod cache;
pub mod generate;
pub mod resolve;
pub mod validate;


use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::GeneratorConfig;
use crate::constants::NO_PROGRESS_ENV_VAR;

/// Output format for commands that can produce machine-readable results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Runtime settings derived from the global command-line flags.
///
/// Kept separate from [`Cli`] so tests can build and apply it without parsing
/// arguments.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: Option<String>,

    /// Hide progress bars. Sets `SPIRAL_NO_PROGRESS` when applied.
    pub no_progress: bool,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply this configuration to the process environment.
    ///
    /// Must be called before any other thread is spawned, since it mutates the
    /// environment.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called once from the main thread before the runtime spawns work
            unsafe {
                std::env::set_var(NO_PROGRESS_ENV_VAR, "1");
            }
        }
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over [`Self::log_level`]. Only the first call in a
    /// process has an effect.
    pub fn init_logging(&self) {
        static INIT: Once = Once::new();

        INIT.call_once(|| {
            let filter = if std::env::var("RUST_LOG").is_ok() {
                EnvFilter::from_default_env()
            } else {
                EnvFilter::new(self.log_level.as_deref().unwrap_or("info"))
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .try_init();
        });
    }

    /// Load the generator configuration named by these settings.
    pub async fn load_generator_config(&self) -> Result<GeneratorConfig> {
        GeneratorConfig::load(self.config_path.as_deref()).await
    }
}

/// Spiral: generate autobuild trees from package descriptors.
#[derive(Parser)]
#[command(
    name = "spiral",
    about = "Generate autobuild trees from package descriptors",
    version,
    long_about = "Spiral turns small package descriptors into autobuild package directories, \
                  resolving versions from Repology and skipping packages whose version has not changed."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors, and hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    ///
    /// Defaults to $SPIRAL_CONFIG, then ./spiral.toml when it exists.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the autobuild tree from the sources tree
    Generate(generate::GenerateCommand),

    /// Validate descriptors without resolving versions
    Validate(validate::ValidateCommand),

    /// Print the resolved version of one descriptor
    Resolve(resolve::ResolveCommand),

    /// Inspect or edit the version cache
    Cache(cache::CacheCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("warn".to_string())
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an externally built configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();
        config.init_logging();

        match self.command {
            Commands::Generate(cmd) => cmd.execute(&config).await,
            Commands::Validate(cmd) => cmd.execute(&config).await,
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Cache(cmd) => cmd.execute(&config).await,
        }
    }
}
