//! Error types for verdict
//!
//! Fatal errors only. A target failing on one case is not an `Error`: it is
//! recorded on that case's result and the run carries on.

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::ResolveError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for verdict
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Failed to read configuration '{path}': {error}")]
    ConfigRead { path: PathBuf, error: String },

    #[error("Invalid configuration file '{path}': {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Suite '{suite}' references unknown target '{target}'")]
    UnknownTarget { suite: String, target: String },

    #[error("Target '{target}' cannot be resolved: {source}")]
    UnresolvedTarget {
        target: String,
        #[source]
        source: ResolveError,
    },

    #[error("Unknown suite '{0}'. Use 'verdict list' to see configured suites")]
    UnknownSuite(String),

    // === Discovery Errors ===
    #[error("Case source not found: {}", path.display())]
    CaseSourceMissing { path: PathBuf },

    #[error("Failed to read case artifact '{}': {error}", path.display())]
    CaseRead { path: PathBuf, error: String },

    #[error("Failed to parse case document '{}': {message}", path.display())]
    CaseParse { path: PathBuf, message: String },

    #[error("Invalid case '{name}' in '{}': {message}", origin.display())]
    InvalidCase {
        name: String,
        origin: PathBuf,
        message: String,
    },

    #[error("Duplicate case name '{name}': defined in '{}' and '{}'", first.display(), second.display())]
    CaseCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration parse error for a file
    pub fn config_parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a case parse error for a file
    pub fn case_parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::CaseParse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid case error
    pub fn invalid_case(name: &str, origin: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::InvalidCase {
            name: name.to_string(),
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error belongs to configuration loading
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::InvalidConfig(_)
                | Error::UnknownTarget { .. }
                | Error::UnresolvedTarget { .. }
                | Error::UnknownSuite(_)
        )
    }

    /// Whether this error belongs to case discovery
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Error::CaseSourceMissing { .. }
                | Error::CaseRead { .. }
                | Error::CaseParse { .. }
                | Error::InvalidCase { .. }
                | Error::CaseCollision { .. }
        )
    }
}

/// Serializable error for machine-readable reports
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorSummary {
    pub code: String,
    pub message: String,
}

impl From<&Error> for ErrorSummary {
    fn from(e: &Error) -> Self {
        let code = if e.is_config() {
            "CONFIG_ERROR"
        } else if e.is_discovery() {
            "DISCOVERY_ERROR"
        } else {
            "INTERNAL_ERROR"
        }
        .to_string();

        Self {
            code,
            message: e.to_string(),
        }
    }
}
