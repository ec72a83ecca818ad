//! `spiral generate`: run the full generation pipeline.
//!
//! Command-line flags override the corresponding configuration fields for this run
//! only. The command exits successfully whenever the run completes, even if some
//! packages were omitted; their reasons are logged and listed in the JSON report.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{CliConfig, OutputFormat};
use crate::config::GeneratorConfig;
use crate::generator::{Generator, ItemOutcome, RunOptions, RunReport};
use crate::utils::fs::expand_path;
use crate::version::RepologyClient;

/// Generate the autobuild tree.
#[derive(Args, Debug, Default)]
pub struct GenerateCommand {
    /// Root of the descriptor tree
    #[arg(long, value_name = "PATH")]
    pub sources: Option<String>,

    /// Template directory
    #[arg(long, value_name = "PATH")]
    pub template: Option<String>,

    /// Output root
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Category directory under the output root
    #[arg(long)]
    pub category: Option<String>,

    /// Version cache file
    #[arg(long, value_name = "PATH")]
    pub cache: Option<String>,

    /// Regenerate every package, ignoring the version cache
    #[arg(long)]
    pub force: bool,

    /// Remove the category directory before generating
    #[arg(long)]
    pub clean: bool,

    /// Maximum number of concurrent version lookups
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_parallel: Option<u16>,

    /// Output format of the run report
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl GenerateCommand {
    /// Run the command.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let mut config = cli.load_generator_config().await?;
        self.apply_overrides(&mut config)?;

        let client =
            RepologyClient::new(&config.repology_endpoint, config.lookup_timeout(), config.lookup_retries)?;
        let options = RunOptions {
            force: self.force,
            clean: self.clean,
        };
        let generator = Generator::new(config, client, options)?;
        let report = generator.run().await?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_summary(&report),
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut GeneratorConfig) -> Result<()> {
        let expand = |value: &Option<String>| value.as_deref().map(expand_path).transpose();

        if let Some(sources) = expand(&self.sources)? {
            config.sources = sources;
        }
        if let Some(template) = expand(&self.template)? {
            config.template = template;
        }
        if let Some(output) = expand(&self.output)? {
            config.output = output;
        }
        if let Some(cache) = expand(&self.cache)? {
            config.cache = cache;
        }
        if let Some(category) = &self.category {
            config.category.clone_from(category);
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = usize::from(max_parallel);
        }

        config.validate()?;
        Ok(())
    }
}

fn print_summary(report: &RunReport) {
    let summary = report.summary;
    println!(
        "{} prepared, {} skipped, {} omitted",
        summary.prepared.to_string().green(),
        summary.skipped.to_string().cyan(),
        if summary.omitted > 0 {
            summary.omitted.to_string().red()
        } else {
            summary.omitted.to_string().normal()
        }
    );

    for item in report.with_outcome(ItemOutcome::Omitted) {
        let label = item.name.clone().unwrap_or_else(|| item.entry.display().to_string());
        println!("  {} {}: {}", "✗".red(), label, item.reason.as_deref().unwrap_or_default());
    }
}
