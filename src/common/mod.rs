//! Common utilities shared by the library and the CLI

pub mod error;
pub mod logging;

pub use error::{Error, ErrorSummary, Result};
