//! Configuration file handling
//!
//! A configuration names the targets under test and the suites that exercise
//! them:
//!
//! ```yaml
//! settings:
//!   max_workers: 4
//! test_suites:
//!   - name: math
//!     target: math_parser
//!     type: single_file
//!     file: cases/math.yaml
//! targets:
//!   math_parser:
//!     callable: verdict.builtin.parse_math_expression
//! ```
//!
//! Every target reference is resolved while loading, so a bad reference
//! fails before any case runs.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::registry::{BoundTarget, TargetRegistry};

/// Raw configuration document
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: SettingsFile,

    test_suites: Option<Vec<SuiteEntry>>,

    targets: Option<BTreeMap<String, TargetEntry>>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    /// Worker pool size, `null` means one worker per logical core
    #[serde(default)]
    max_workers: Option<usize>,
}

/// Layout of a suite's cases
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    /// One directory per case
    CasesInFolder,
    /// One or more documents mapping case names to cases
    SingleFile,
}

#[derive(Debug, Deserialize)]
struct SuiteEntry {
    name: String,
    target: String,
    #[serde(rename = "type")]
    kind: SuiteKind,
    folder: Option<PathBuf>,
    file: Option<PathBuf>,
    #[serde(default, alias = "cases")]
    files: Vec<PathBuf>,
    /// Suite-wide optional fields, merged into every case's own list
    #[serde(default)]
    optional_fields: Vec<String>,
    #[serde(default = "default_input_file")]
    input_file: String,
    #[serde(default = "default_expected_file")]
    expected_file: String,
}

fn default_input_file() -> String {
    "input.txt".to_string()
}

fn default_expected_file() -> String {
    "expected_output.yaml".to_string()
}

#[derive(Debug, Deserialize)]
struct TargetEntry {
    callable: String,
}

/// Execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Maximum number of cases executing at once
    pub max_workers: usize,
}

impl Settings {
    /// Build settings from an optional worker count
    ///
    /// `None` picks the host's logical core count.
    pub fn new(max_workers: Option<usize>) -> Result<Self> {
        let max_workers = match max_workers {
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "'max_workers' must be at least 1".to_string(),
                ))
            }
            Some(n) => n,
            None => default_max_workers(),
        };
        Ok(Self { max_workers })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A target with its reference already resolved
pub struct TargetSpec {
    pub id: String,
    pub reference: String,
    pub bound: BoundTarget,
}

impl fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSpec")
            .field("id", &self.id)
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}

/// Where a suite's cases come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseSource {
    /// Recursive scan for directories holding both artifacts
    Folder {
        root: PathBuf,
        input_file: String,
        expected_file: String,
    },
    /// Case documents, merged in order
    Documents(Vec<PathBuf>),
}

impl fmt::Display for CaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseSource::Folder { root, .. } => write!(f, "folder {}", root.display()),
            CaseSource::Documents(paths) => {
                let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "file {}", names.join(", "))
            }
        }
    }
}

/// A validated suite definition
#[derive(Debug, Clone)]
pub struct SuiteSpec {
    pub name: String,
    pub target: Arc<TargetSpec>,
    pub source: CaseSource,
    pub optional_fields: BTreeSet<String>,
}

/// A fully loaded and validated configuration
#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
    pub suites: Vec<SuiteSpec>,
    pub targets: BTreeMap<String, Arc<TargetSpec>>,
}

impl Config {
    /// Load configuration from a YAML (or `.toml`) file
    pub fn load(path: &Path, registry: &TargetRegistry) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");

        let file: ConfigFile = if is_toml {
            toml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        };

        let config = Self::from_file(file, base_dir, registry)?;
        tracing::debug!(
            "Loaded {} suites and {} targets from {}",
            config.suites.len(),
            config.targets.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load configuration from YAML text, resolving paths against `base_dir`
    pub fn from_yaml_str(content: &str, base_dir: &Path, registry: &TargetRegistry) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| Error::config_parse(base_dir.join("<inline>"), e))?;
        Self::from_file(file, base_dir, registry)
    }

    fn from_file(file: ConfigFile, base_dir: &Path, registry: &TargetRegistry) -> Result<Self> {
        let entries = file.test_suites.ok_or_else(|| {
            Error::InvalidConfig("configuration must contain 'test_suites'".to_string())
        })?;
        let target_entries = file.targets.ok_or_else(|| {
            Error::InvalidConfig("configuration must contain 'targets'".to_string())
        })?;

        let settings = Settings::new(file.settings.max_workers)?;

        let mut targets = BTreeMap::new();
        for (id, entry) in target_entries {
            let bound = registry
                .resolve(&entry.callable)
                .map_err(|source| Error::UnresolvedTarget {
                    target: id.clone(),
                    source,
                })?;
            targets.insert(
                id.clone(),
                Arc::new(TargetSpec {
                    id,
                    reference: entry.callable,
                    bound,
                }),
            );
        }

        let mut seen = BTreeSet::new();
        let mut suites = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(Error::InvalidConfig("suite name must not be empty".to_string()));
            }
            if !seen.insert(entry.name.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate suite name '{}'",
                    entry.name
                )));
            }
            suites.push(build_suite(entry, base_dir, &targets)?);
        }

        Ok(Self {
            settings,
            suites,
            targets,
        })
    }

    /// Look up a suite by name
    pub fn suite(&self, name: &str) -> Result<&SuiteSpec> {
        self.suites
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnknownSuite(name.to_string()))
    }

    /// Select suites by name, or all suites in configuration order
    pub fn select(&self, name: Option<&str>) -> Result<Vec<SuiteSpec>> {
        match name {
            Some(name) => Ok(vec![self.suite(name)?.clone()]),
            None => Ok(self.suites.clone()),
        }
    }
}

fn build_suite(
    entry: SuiteEntry,
    base_dir: &Path,
    targets: &BTreeMap<String, Arc<TargetSpec>>,
) -> Result<SuiteSpec> {
    let target = targets
        .get(&entry.target)
        .cloned()
        .ok_or_else(|| Error::UnknownTarget {
            suite: entry.name.clone(),
            target: entry.target.clone(),
        })?;

    let source = match entry.kind {
        SuiteKind::CasesInFolder => {
            let folder = entry.folder.ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "suite '{}' with type 'cases_in_folder' must have a 'folder' field",
                    entry.name
                ))
            })?;
            CaseSource::Folder {
                root: resolve_path(base_dir, &folder),
                input_file: entry.input_file,
                expected_file: entry.expected_file,
            }
        }
        SuiteKind::SingleFile => {
            let paths: Vec<PathBuf> = entry
                .file
                .iter()
                .chain(entry.files.iter())
                .map(|p| resolve_path(base_dir, p))
                .collect();
            if paths.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "suite '{}' with type 'single_file' must have a 'file' or 'files' field",
                    entry.name
                )));
            }
            CaseSource::Documents(paths)
        }
    };

    Ok(SuiteSpec {
        name: entry.name,
        target,
        source,
        optional_fields: entry.optional_fields.into_iter().collect(),
    })
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
