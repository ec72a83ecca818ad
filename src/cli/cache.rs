//! `spiral cache`: inspect and edit the version cache.
//!
//! Removing an entry is the way to force one package to be regenerated on the next
//! run without touching the others. Mutations take the same run lock as `generate`.

use std::path::Path;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

use super::{CliConfig, OutputFormat};
use crate::cache::{RunLock, VersionCache};
use crate::utils::fs::expand_path;

/// Manage the version cache.
#[derive(Args, Debug)]
pub struct CacheCommand {
    /// Version cache file (default: from configuration)
    #[arg(long, value_name = "PATH", global = true)]
    pub cache: Option<String>,

    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache operations.
#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List recorded versions
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Forget the recorded version of a package
    Remove {
        /// Package name
        name: String,
    },

    /// Forget every recorded version
    Clear,
}

impl CacheCommand {
    /// Run the command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let path = match &self.cache {
            Some(path) => expand_path(path)?,
            None => cli.load_generator_config().await?.cache,
        };
        self.command.execute_on(&path).await
    }
}

impl CacheSubcommand {
    /// Run the operation against the cache file at `path`.
    pub async fn execute_on(self, path: &Path) -> Result<()> {
        match self {
            Self::List {
                format,
            } => {
                let cache = VersionCache::load(path);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cache)?),
                    OutputFormat::Text if cache.is_empty() => {
                        println!("No versions recorded in {}", path.display());
                    }
                    OutputFormat::Text => {
                        for (name, version) in cache.iter() {
                            println!("{} {}", name.bold(), version);
                        }
                    }
                }
                Ok(())
            }
            Self::Remove {
                name,
            } => {
                let _lock = RunLock::acquire(path).await?;
                let mut cache = VersionCache::load(path);
                let Some(previous) = cache.remove(&name) else {
                    bail!("No version recorded for '{name}' in {}", path.display());
                };
                cache.persist(path)?;
                info!("Removed {} ({})", name, previous);
                println!("{} Removed {} {}", "✓".green(), name, previous);
                Ok(())
            }
            Self::Clear => {
                let _lock = RunLock::acquire(path).await?;
                let mut cache = VersionCache::load(path);
                let count = cache.len();
                cache.clear();
                cache.persist(path)?;
                println!("{} Cleared {} entries", "✓".green(), count);
                Ok(())
            }
        }
    }
}
