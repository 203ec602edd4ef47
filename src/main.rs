//! Verdict CLI - data-driven regression tests for parsing targets
//!
//! Discovers test cases from YAML documents or folders, runs them against
//! registered targets in parallel and reports field-level differences.

use clap::Parser;
use std::path::PathBuf;
use verdict::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "verdict", about = "Data-driven test runner for parsing targets")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to the configuration file (.yaml, .yml or .toml)
    #[arg(long, short, global = true, default_value = "verdict.yaml")]
    config: PathBuf,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match cli::dispatch(&cli.config, cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
