//! Case discovery
//!
//! Two layouts are supported:
//!
//! - **Folder**: any directory below the suite root holding both an input
//!   artifact and an expected-output document is a case. Its name is the
//!   relative path joined with dots (`scout_ci/job_180` -> `scout_ci.job_180`).
//! - **Documents**: each document maps case names to
//!   `{input, expected, optional_fields}`.
//!
//! Cases come back sorted by name. Two sources producing the same name is an
//! error, never a silent overwrite.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::common::{Error, Result};
use crate::config::{CaseSource, SuiteSpec};
use crate::value::{Value, ValueMap};

/// Key in an expected-output document listing the case's optional fields
pub const OPTIONAL_FIELDS_KEY: &str = "optional_fields";

/// A single input / expected-output pair
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    /// Dot-separated hierarchical name, unique within the suite
    pub name: String,
    /// Raw text handed to the target
    pub input: String,
    /// Expected target output
    pub expected: ValueMap,
    /// Fields whose divergence is a warning rather than a failure
    pub optional_fields: BTreeSet<String>,
    /// File or directory the case was read from
    pub origin: PathBuf,
}

/// Discover every case of a suite, sorted by name
///
/// Suite-wide optional fields are merged into each case's own set.
pub fn discover(suite: &SuiteSpec) -> Result<Vec<Case>> {
    let mut cases = match &suite.source {
        CaseSource::Folder {
            root,
            input_file,
            expected_file,
        } => discover_folder(root, input_file, expected_file)?,
        CaseSource::Documents(paths) => discover_documents(paths)?,
    };

    if !suite.optional_fields.is_empty() {
        for case in &mut cases {
            case.optional_fields
                .extend(suite.optional_fields.iter().cloned());
        }
    }

    tracing::debug!("Discovered {} cases for suite '{}'", cases.len(), suite.name);
    Ok(cases)
}

/// Whether a case name equals `prefix` or is nested below it
///
/// `"a"` matches `"a"` and `"a.b"` but not `"ab"`. An empty prefix matches everything.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    if prefix.is_empty() || name == prefix {
        return true;
    }
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Keep the cases selected by a path prefix, preserving order
pub fn filter(cases: Vec<Case>, prefix: &str) -> Vec<Case> {
    cases
        .into_iter()
        .filter(|c| matches_prefix(&c.name, prefix))
        .collect()
}

/// Collects cases by name, rejecting duplicates
#[derive(Default)]
struct CaseSet {
    cases: BTreeMap<String, Case>,
}

impl CaseSet {
    fn insert(&mut self, case: Case) -> Result<()> {
        match self.cases.entry(case.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(case);
                Ok(())
            }
            Entry::Occupied(existing) => Err(Error::CaseCollision {
                name: case.name,
                first: existing.get().origin.clone(),
                second: case.origin,
            }),
        }
    }

    fn into_sorted(self) -> Vec<Case> {
        self.cases.into_values().collect()
    }
}

// === Folder layout ===

fn discover_folder(root: &Path, input_file: &str, expected_file: &str) -> Result<Vec<Case>> {
    if !root.is_dir() {
        return Err(Error::CaseSourceMissing {
            path: root.to_path_buf(),
        });
    }

    let mut set = CaseSet::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| Error::CaseRead {
            path: e.path().unwrap_or(root).to_path_buf(),
            error: e.to_string(),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        let input_path = dir.join(input_file);
        let expected_path = dir.join(expected_file);

        match (input_path.is_file(), expected_path.is_file()) {
            (true, true) => {}
            (false, false) => continue,
            (has_input, _) => {
                let missing = if has_input { expected_file } else { input_file };
                tracing::warn!(
                    "Skipping incomplete case directory {}: missing {}",
                    dir.display(),
                    missing
                );
                continue;
            }
        }

        let name = case_name(root, dir);
        let input = read_artifact(&input_path)?;
        let mut expected = parse_expected_document(&expected_path)?;
        let optional_fields = take_optional_fields(&mut expected, &name, &expected_path)?;

        set.insert(Case {
            name,
            input,
            expected,
            optional_fields,
            origin: dir.to_path_buf(),
        })?;
    }

    Ok(set.into_sorted())
}

fn case_name(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

fn read_artifact(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::CaseRead {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn parse_expected_document(path: &Path) -> Result<ValueMap> {
    let content = read_artifact(path)?;
    if content.trim().is_empty() {
        return Ok(ValueMap::new());
    }
    let value: Value = serde_yaml::from_str(&content).map_err(|e| Error::case_parse(path, e))?;
    match value {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(ValueMap::new()),
        other => Err(Error::case_parse(
            path,
            format!("expected output must be a mapping, got {}", other.type_name()),
        )),
    }
}

fn take_optional_fields(
    expected: &mut ValueMap,
    name: &str,
    origin: &Path,
) -> Result<BTreeSet<String>> {
    match expected.remove(OPTIONAL_FIELDS_KEY) {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(Value::List(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(field) => Ok(field),
                other => Err(Error::invalid_case(
                    name,
                    origin,
                    format!("'{}' entries must be strings, got {}", OPTIONAL_FIELDS_KEY, other),
                )),
            })
            .collect(),
        Some(other) => Err(Error::invalid_case(
            name,
            origin,
            format!("'{}' must be a list, got {}", OPTIONAL_FIELDS_KEY, other.type_name()),
        )),
    }
}

// === Document layout ===

/// A case as written in a case document
#[derive(Debug, Deserialize)]
struct DocumentCase {
    input: CaseInput,
    expected: ValueMap,
    #[serde(default)]
    optional_fields: Vec<String>,
}

/// Case input, either plain text or `{type, content}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaseInput {
    Text(String),
    Typed {
        #[serde(rename = "type")]
        #[allow(dead_code)]
        kind: Option<String>,
        content: String,
    },
}

impl CaseInput {
    fn into_text(self) -> String {
        match self {
            CaseInput::Text(text) => text,
            CaseInput::Typed { content, .. } => content,
        }
    }
}

fn discover_documents(paths: &[PathBuf]) -> Result<Vec<Case>> {
    let mut set = CaseSet::default();

    for path in paths {
        if !path.is_file() {
            return Err(Error::CaseSourceMissing { path: path.clone() });
        }

        let content = read_artifact(path)?;
        if content.trim().is_empty() {
            continue;
        }
        let document: Option<OrderedEntries<serde_yaml::Value>> =
            serde_yaml::from_str(&content).map_err(|e| Error::case_parse(path, e))?;

        let Some(OrderedEntries(entries)) = document else {
            // An empty document holds no cases
            continue;
        };

        for (name, raw) in entries {
            let case: DocumentCase = serde_yaml::from_value(raw)
                .map_err(|e| Error::invalid_case(&name, path, e))?;
            set.insert(Case {
                name,
                input: case.input.into_text(),
                expected: case.expected,
                optional_fields: case.optional_fields.into_iter().collect(),
                origin: path.clone(),
            })?;
        }
    }

    Ok(set.into_sorted())
}

/// Mapping entries in document order, duplicates preserved
struct OrderedEntries<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of case names to cases")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SuiteSpec};
    use crate::registry::TargetRegistry;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn suite(source: CaseSource) -> SuiteSpec {
        let config = Config::from_yaml_str(
            r#"
test_suites:
  - {name: s, target: t, type: single_file, file: unused.yaml}
targets:
  t: {callable: verdict.builtin.echo}
"#,
            Path::new("."),
            &TargetRegistry::with_builtins(),
        )
        .unwrap();
        let mut spec = config.suites[0].clone();
        spec.source = source;
        spec
    }

    fn folder(root: &Path) -> CaseSource {
        CaseSource::Folder {
            root: root.to_path_buf(),
            input_file: "input.txt".to_string(),
            expected_file: "expected_output.yaml".to_string(),
        }
    }

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("a", "a"));
        assert!(matches_prefix("a.b", "a"));
        assert!(matches_prefix("a.b.c", "a.b"));
        assert!(!matches_prefix("ab", "a"));
        assert!(!matches_prefix("a", "a.b"));
        assert!(matches_prefix("anything", ""));
    }

    #[test]
    fn test_folder_layout_names_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("scout_ci/job_180/input.txt"), "raw 180");
        write(&root.join("scout_ci/job_180/expected_output.yaml"), "a: 1\n");
        write(&root.join("scout_ci/job_2/input.txt"), "raw 2");
        write(&root.join("scout_ci/job_2/expected_output.yaml"), "a: 2\n");
        write(&root.join("basic/input.txt"), "raw basic");
        write(&root.join("basic/expected_output.yaml"), "a: 3\n");

        let cases = discover(&suite(folder(root))).unwrap();
        let names: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["basic", "scout_ci.job_180", "scout_ci.job_2"]);
        assert_eq!(cases[1].input, "raw 180");
        assert_eq!(cases[1].expected["a"], Value::Int(1));
    }

    #[test]
    fn test_folder_optional_fields_extracted() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("c/input.txt"), "x");
        write(
            &dir.path().join("c/expected_output.yaml"),
            "a: 1\noptional_fields: [b]\n",
        );

        let cases = discover(&suite(folder(dir.path()))).unwrap();
        assert_eq!(cases.len(), 1);
        assert!(cases[0].optional_fields.contains("b"));
        assert!(!cases[0].expected.contains_key(OPTIONAL_FIELDS_KEY));
    }

    #[test]
    fn test_folder_incomplete_directory_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("only_input/input.txt"), "x");
        write(&dir.path().join("full/input.txt"), "x");
        write(&dir.path().join("full/expected_output.yaml"), "{}\n");

        let cases = discover(&suite(folder(dir.path()))).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "full");
    }

    #[test]
    fn test_folder_empty_root_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let cases = discover(&suite(folder(dir.path()))).unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_folder_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&suite(folder(&dir.path().join("nope")))).unwrap_err();
        assert!(matches!(err, Error::CaseSourceMissing { .. }));
    }

    #[test]
    fn test_folder_unparseable_expected() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("bad/input.txt"), "x");
        write(&dir.path().join("bad/expected_output.yaml"), "a: [1, 2\n");

        let err = discover(&suite(folder(dir.path()))).unwrap_err();
        assert!(matches!(err, Error::CaseParse { .. }));
        assert!(err.is_discovery());
    }

    #[test]
    fn test_folder_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a/b/input.txt"), "x");
        write(&dir.path().join("a/b/expected_output.yaml"), "{}\n");
        write(&dir.path().join("a.b/input.txt"), "y");
        write(&dir.path().join("a.b/expected_output.yaml"), "{}\n");

        match discover(&suite(folder(dir.path()))) {
            Err(Error::CaseCollision { name, first, second }) => {
                assert_eq!(name, "a.b");
                assert_ne!(first, second);
            }
            other => panic!("Expected CaseCollision, got {:?}", other),
        }
    }

    #[test]
    fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("cases.yaml");
        write(
            &doc,
            r#"
zeta:
  input: "2 + 3 = 5"
  expected: {valid: true}
alpha:
  input:
    type: text
    content: "1 + 1 = 2"
  expected: {valid: true, result: 2}
  optional_fields: [operator]
"#,
        );

        let cases = discover(&suite(CaseSource::Documents(vec![doc.clone()]))).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].name, "alpha");
        assert_eq!(cases[0].input, "1 + 1 = 2");
        assert!(cases[0].optional_fields.contains("operator"));
        assert_eq!(cases[1].name, "zeta");
        assert_eq!(cases[1].origin, doc);
    }

    #[test]
    fn test_document_empty_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("empty.yaml");
        write(&doc, "");
        let cases = discover(&suite(CaseSource::Documents(vec![doc]))).unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_document_collision_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.yaml");
        let two = dir.path().join("two.yaml");
        write(&one, "same:\n  input: a\n  expected: {}\n");
        write(&two, "same:\n  input: b\n  expected: {}\n");

        match discover(&suite(CaseSource::Documents(vec![one.clone(), two.clone()]))) {
            Err(Error::CaseCollision { name, first, second }) => {
                assert_eq!(name, "same");
                assert_eq!(first, one);
                assert_eq!(second, two);
            }
            other => panic!("Expected CaseCollision, got {:?}", other),
        }
    }

    #[test]
    fn test_document_case_missing_expected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("cases.yaml");
        write(&doc, "broken:\n  input: a\n");

        match discover(&suite(CaseSource::Documents(vec![doc]))) {
            Err(Error::InvalidCase { name, .. }) => assert_eq!(name, "broken"),
            other => panic!("Expected InvalidCase, got {:?}", other),
        }
    }

    #[test]
    fn test_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&suite(CaseSource::Documents(vec![dir.path().join("x.yaml")])))
            .unwrap_err();
        assert!(matches!(err, Error::CaseSourceMissing { .. }));
    }

    #[test]
    fn test_suite_optional_fields_merged() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("cases.yaml");
        write(
            &doc,
            "c:\n  input: a\n  expected: {}\n  optional_fields: [own]\n",
        );

        let mut spec = suite(CaseSource::Documents(vec![doc]));
        spec.optional_fields.insert("shared".to_string());
        let cases = discover(&spec).unwrap();
        assert!(cases[0].optional_fields.contains("own"));
        assert!(cases[0].optional_fields.contains("shared"));
    }

    #[test]
    fn test_filter() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("cases.yaml");
        write(
            &doc,
            "a:\n  input: x\n  expected: {}\na.b:\n  input: x\n  expected: {}\nab:\n  input: x\n  expected: {}\n",
        );
        let cases = discover(&suite(CaseSource::Documents(vec![doc]))).unwrap();
        let names: Vec<String> = filter(cases, "a").into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "a.b"]);
    }
}
