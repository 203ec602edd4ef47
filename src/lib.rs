//! Verdict - a data-driven test runner
//!
//! Test cases pair a raw text input with an expected output mapping. Each
//! case is fed to a named target, and the target's output is compared field
//! by field against the expectation.
//!
//! Targets are registered in a [`TargetRegistry`] under dotted references and
//! bound to suites through the configuration file.

pub mod cli;
pub mod commands;
pub mod common;
pub mod comparator;
pub mod config;
pub mod discovery;
pub mod executor;
pub mod registry;
pub mod report;
pub mod runner;
pub mod targets;
pub mod value;

// Re-export commonly used types for embedders and tests
pub use common::{Error, Result};
pub use config::Config;
pub use registry::{Target, TargetOutput, TargetRegistry};
pub use report::{RunReport, Status};
pub use runner::Runner;
pub use value::{Value, ValueMap};
