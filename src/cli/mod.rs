//! CLI command handling
//!
//! Loads configuration, dispatches commands and formats their output.

use std::path::Path;

use crate::commands::{Commands, OutputFormat};
use crate::common::Result;
use crate::config::{Config, Settings};
use crate::discovery;
use crate::registry::TargetRegistry;
use crate::report::Reporter;
use crate::runner::Runner;

/// Rendered output of a command and the exit code it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub exit_code: i32,
}

impl Outcome {
    fn listing(output: String) -> Self {
        Self {
            output,
            exit_code: 0,
        }
    }
}

/// Dispatch a CLI command using the built-in targets
pub async fn dispatch(config_path: &Path, command: Commands) -> Result<i32> {
    dispatch_with(&TargetRegistry::with_builtins(), config_path, command).await
}

/// Dispatch a CLI command against a caller-supplied registry, printing its output
pub async fn dispatch_with(
    registry: &TargetRegistry,
    config_path: &Path,
    command: Commands,
) -> Result<i32> {
    let outcome = execute(registry, config_path, command).await?;
    print!("{}", outcome.output);
    if !outcome.output.ends_with('\n') {
        println!();
    }
    Ok(outcome.exit_code)
}

/// Run a command and render its output without printing it
pub async fn execute(
    registry: &TargetRegistry,
    config_path: &Path,
    command: Commands,
) -> Result<Outcome> {
    let config = Config::load(config_path, registry)?;

    match command {
        Commands::List { suite, cases, json } => {
            let reporter = Reporter::default();

            let Some(name) = suite else {
                let output = if json {
                    reporter.render_suite_list_json(&config.suites)?
                } else {
                    reporter.render_suite_list(&config.suites)
                };
                return Ok(Outcome::listing(output));
            };

            let suite = config.suite(&name)?;
            let mut found = discovery::discover(suite)?;
            if let Some(prefix) = cases.as_deref() {
                found = discovery::filter(found, prefix);
            }

            let output = if json {
                reporter.render_case_list_json(&suite.name, &found)?
            } else {
                reporter.render_case_list(&suite.name, &found)
            };
            Ok(Outcome::listing(output))
        }

        Commands::Run {
            suite,
            cases,
            workers,
            format,
            no_color,
            timings,
        } => {
            let settings = match workers {
                Some(n) => Settings::new(Some(n))?,
                None => config.settings,
            };
            let suites = config.select(suite.as_deref())?;

            tracing::debug!(
                "Running {} suite(s) with {} workers",
                suites.len(),
                settings.max_workers
            );

            let runner = Runner::new(settings);
            let report = runner.run(&suites, cases.as_deref()).await;

            let output = match format {
                OutputFormat::Console => {
                    Reporter::new(!no_color, timings).render_console(&report)
                }
                OutputFormat::Json => Reporter::new(false, timings).render_json(&report)?,
            };

            Ok(Outcome {
                output,
                exit_code: report.exit_code(),
            })
        }
    }
}
