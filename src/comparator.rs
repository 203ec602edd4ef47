//! Expected vs. actual comparison
//!
//! Field policy, applied per top-level key:
//!
//! | expected | actual  | optional | entry      | fails the case |
//! |----------|---------|----------|------------|----------------|
//! | present  | absent  | no       | `missing`  | yes            |
//! | present  | absent  | yes      | none       | no             |
//! | present  | unequal | no       | `mismatch` | yes            |
//! | present  | unequal | yes      | `mismatch` | no (warning)   |
//! | absent   | present | any      | `extra`    | no (warning)   |
//!
//! Values are compared with deep structural equality over [`Value`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::report::Status;
use crate::value::{Value, ValueMap};

/// Kind of field-level discrepancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Missing,
    Mismatch,
    Extra,
}

/// Whether a discrepancy fails the case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Failure,
    Warning,
}

/// A single field-level discrepancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub field: String,
    pub kind: DiffKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl DiffEntry {
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        let show = |v: &Option<Value>| v.as_ref().map_or_else(String::new, Value::to_string);
        match self.kind {
            DiffKind::Missing => format!(
                "Missing field '{}' (expected {})",
                self.field,
                show(&self.expected)
            ),
            DiffKind::Mismatch => format!(
                "Field '{}' mismatch: expected {}, got {}",
                self.field,
                show(&self.expected),
                show(&self.actual)
            ),
            DiffKind::Extra => format!(
                "Extra field '{}' = {}",
                self.field,
                show(&self.actual)
            ),
        }
    }
}

/// Result of comparing one case's output
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub status: Status,
    pub diffs: Vec<DiffEntry>,
}

impl Comparison {
    /// Number of entries that did not fail the case
    pub fn warning_count(&self) -> usize {
        self.diffs.iter().filter(|d| d.is_warning()).count()
    }
}

/// Compare expected and actual output under the optional-field policy
///
/// Entries for expected keys come first in key order, then extra keys in
/// key order. The status is `Fail` iff some entry has `Failure` severity.
pub fn compare(expected: &ValueMap, actual: &ValueMap, optional: &BTreeSet<String>) -> Comparison {
    let mut diffs = Vec::new();

    for (field, expected_value) in expected {
        let is_optional = optional.contains(field);

        match actual.get(field) {
            None if is_optional => {}
            None => diffs.push(DiffEntry {
                field: field.clone(),
                kind: DiffKind::Missing,
                severity: Severity::Failure,
                expected: Some(expected_value.clone()),
                actual: None,
            }),
            Some(actual_value) if actual_value != expected_value => diffs.push(DiffEntry {
                field: field.clone(),
                kind: DiffKind::Mismatch,
                severity: if is_optional {
                    Severity::Warning
                } else {
                    Severity::Failure
                },
                expected: Some(expected_value.clone()),
                actual: Some(actual_value.clone()),
            }),
            Some(_) => {}
        }
    }

    for (field, actual_value) in actual {
        if !expected.contains_key(field) {
            diffs.push(DiffEntry {
                field: field.clone(),
                kind: DiffKind::Extra,
                severity: Severity::Warning,
                expected: None,
                actual: Some(actual_value.clone()),
            });
        }
    }

    let status = if diffs.iter().any(DiffEntry::is_failure) {
        Status::Fail
    } else {
        Status::Pass
    };

    Comparison { status, diffs }
}
