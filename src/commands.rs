//! CLI command definitions
//!
//! Defines the clap commands for the verdict CLI.

use clap::{Subcommand, ValueEnum};

/// Report format for `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Console,
    /// Structured JSON on stdout
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured suites, or the cases of one suite
    #[command(alias = "ls")]
    List {
        /// Suite whose cases to list
        suite: Option<String>,

        /// Only list cases whose name equals or is nested below this prefix
        #[arg(long, requires = "suite")]
        cases: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run all suites, or a single suite
    Run {
        /// Suite to run (default: all suites in configuration order)
        suite: Option<String>,

        /// Only run cases whose name equals or is nested below this prefix
        #[arg(long)]
        cases: Option<String>,

        /// Maximum concurrent case executions (overrides settings.max_workers)
        #[arg(long, short = 'w')]
        workers: Option<usize>,

        /// Report format
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Console)]
        format: OutputFormat,

        /// Disable colored console output
        #[arg(long)]
        no_color: bool,

        /// Include per-case durations in the report
        #[arg(long)]
        timings: bool,
    },
}
