//! `spiral resolve`: print the version one descriptor resolves to.
//!
//! Runs the validator and the resolver only. The version cache is neither read nor
//! written, and nothing is generated.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{CliConfig, OutputFormat};
use crate::config::GeneratorConfig;
use crate::core::SpiralError;
use crate::generator::read_descriptor;
use crate::version::{RepologyClient, VersionLookup, VersionResolver};

/// Resolve one descriptor's version.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Descriptor file
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// What `resolve` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Package name
    pub name: String,
    /// Resolved version
    pub version: String,
}

/// Resolve the descriptor at `path` with the given lookup.
pub async fn resolve_descriptor<L: VersionLookup>(
    path: &Path,
    config: &GeneratorConfig,
    lookup: L,
) -> Result<Resolution> {
    let descriptor = read_descriptor(path)?;
    let resolver = VersionResolver::new(lookup, config.resolver_options());
    let version = resolver.resolve(&descriptor.version_spec()).await.map_err(SpiralError::from)?;
    Ok(Resolution {
        name: descriptor.name,
        version,
    })
}

impl ResolveCommand {
    /// Run the command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = cli.load_generator_config().await?;
        let client =
            RepologyClient::new(&config.repology_endpoint, config.lookup_timeout(), config.lookup_retries)?;

        let resolution = resolve_descriptor(&self.descriptor, &config, client).await?;
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
            OutputFormat::Text => println!("{} {}", resolution.name, resolution.version),
        }
        Ok(())
    }
}
