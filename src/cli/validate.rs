//! `spiral validate`: check descriptors without resolving versions.
//!
//! With no paths, every file under the configured sources tree is checked. Directories
//! are skipped here even though `generate` reports them as omitted, so a nested layout
//! validates cleanly; a directory named explicitly still fails. The command fails when
//! any descriptor is invalid.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use super::{CliConfig, OutputFormat};
use crate::generator::{discover_candidates, read_descriptor};

/// Validate descriptors.
#[derive(Args, Debug, Default)]
pub struct ValidateCommand {
    /// Descriptor files to check (default: the whole sources tree)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Result for one checked descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// The descriptor path
    pub path: PathBuf,
    /// Package name when valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Validation failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    /// Whether the descriptor passed.
    pub const fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Validate every path, in order.
pub fn validate_paths(paths: &[PathBuf]) -> Vec<ValidationOutcome> {
    paths
        .iter()
        .map(|path| match read_descriptor(path) {
            Ok(descriptor) => ValidationOutcome {
                path: path.clone(),
                name: Some(descriptor.name),
                error: None,
            },
            Err(e) => ValidationOutcome {
                path: path.clone(),
                name: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

/// Candidates below `source_root` that are not directories.
pub fn descriptor_files(source_root: &Path) -> Vec<PathBuf> {
    discover_candidates(source_root)
        .into_iter()
        .filter(|path| {
            let is_dir = path.is_dir();
            if is_dir {
                debug!("Skipping directory {}", path.display());
            }
            !is_dir
        })
        .collect()
}

impl ValidateCommand {
    /// Run the command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let paths = if self.paths.is_empty() {
            let config = cli.load_generator_config().await?;
            descriptor_files(&config.sources)
        } else {
            self.paths
        };

        let outcomes = validate_paths(&paths);
        let failed = outcomes.iter().filter(|o| !o.is_valid()).count();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
            OutputFormat::Text => {
                for outcome in &outcomes {
                    match (&outcome.name, &outcome.error) {
                        (_, Some(error)) => {
                            println!("{} {}: {}", "✗".red(), outcome.path.display(), error);
                        }
                        (Some(name), None) => {
                            println!("{} {} ({})", "✓".green(), outcome.path.display(), name);
                        }
                        (None, None) => {}
                    }
                }
                println!("{} of {} descriptors valid", outcomes.len() - failed, outcomes.len());
            }
        }

        if failed > 0 {
            bail!("{failed} descriptor(s) failed validation");
        }
        Ok(())
    }
}
