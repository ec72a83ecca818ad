//! Spiral CLI entry point
//!
//! Parses the command line, runs the selected command and renders fatal errors with
//! their suggestions. Commands:
//! - `generate` - generate the autobuild tree
//! - `validate` - validate descriptors
//! - `resolve` - print one descriptor's resolved version
//! - `cache` - inspect or edit the version cache

use anyhow::Result;
use clap::Parser;
use spiral_cli::cli;
use spiral_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
