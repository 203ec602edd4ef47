//! Results and their rendering
//!
//! Reports keep cases in discovery order. Durations are measured but left
//! out of rendered output unless timings are requested, so re-running an
//! unchanged suite renders identically.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::{ErrorSummary, Result};
use crate::comparator::DiffEntry;
use crate::config::SuiteSpec;
use crate::discovery::Case;
use crate::executor::InvocationFailure;
use crate::value::ValueMap;

const RULE: &str =
    "======================================================================";
const THIN_RULE: &str =
    "----------------------------------------------------------------------";

/// Outcome of a case, or of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pass => write!(f, "pass"),
            Status::Fail => write!(f, "fail"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// Result of executing and comparing one case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub case: String,
    pub status: Status,
    /// Target output, absent when the invocation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<ValueMap>,
    pub diffs: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<InvocationFailure>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ExecutionResult {
    /// Whether the case passed but recorded warnings
    pub fn has_warnings(&self) -> bool {
        self.diffs.iter().any(DiffEntry::is_warning)
    }
}

/// Tally of case outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    /// Passed cases that carry at least one warning
    pub passed_with_warnings: usize,
}

impl Counts {
    fn tally<'a>(results: impl IntoIterator<Item = &'a ExecutionResult>) -> Self {
        let mut counts = Counts::default();
        for result in results {
            counts.total += 1;
            match result.status {
                Status::Pass => {
                    counts.passed += 1;
                    if result.has_warnings() {
                        counts.passed_with_warnings += 1;
                    }
                }
                Status::Fail => counts.failed += 1,
                Status::Error => counts.errors += 1,
            }
        }
        counts
    }

    fn add(&mut self, other: Counts) {
        self.total += other.total;
        self.passed += other.passed;
        self.failed += other.failed;
        self.errors += other.errors;
        self.passed_with_warnings += other.passed_with_warnings;
    }
}

/// Results of one suite, in discovery order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    /// Dotted reference of the suite's target
    pub target: String,
    pub counts: Counts,
    pub results: Vec<ExecutionResult>,
    #[serde(skip)]
    pub duration: Duration,
}

impl SuiteReport {
    pub fn new(suite: &str, target: &str, results: Vec<ExecutionResult>, duration: Duration) -> Self {
        Self {
            suite: suite.to_string(),
            target: target.to_string(),
            counts: Counts::tally(&results),
            results,
            duration,
        }
    }

    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.status == Status::Pass)
    }
}

/// A suite that could not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteFailure {
    pub suite: String,
    pub error: ErrorSummary,
}

/// Everything a run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
    pub aborted: Vec<SuiteFailure>,
    pub duration: Duration,
}

impl RunReport {
    /// Aggregate counts across suites
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for suite in &self.suites {
            counts.add(suite.counts);
        }
        counts
    }

    /// Pass iff every result passed and no suite was aborted
    pub fn status(&self) -> Status {
        let counts = self.counts();
        if counts.errors > 0 || !self.aborted.is_empty() {
            Status::Error
        } else if counts.failed > 0 {
            Status::Fail
        } else {
            Status::Pass
        }
    }

    pub fn passed(&self) -> bool {
        self.status() == Status::Pass
    }

    /// Process exit code: 0 pass, 1 failures, 2 errors
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            Status::Pass => 0,
            Status::Fail => 1,
            Status::Error => 2,
        }
    }
}

#[derive(Serialize)]
struct RunView<'a> {
    status: Status,
    summary: Counts,
    suites: &'a [SuiteReport],
    aborted: &'a [SuiteFailure],
}

#[derive(Serialize)]
struct SuiteListEntry<'a> {
    name: &'a str,
    target: &'a str,
    callable: &'a str,
    source: String,
}

#[derive(Serialize)]
struct CaseListEntry<'a> {
    name: &'a str,
    origin: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    optional_fields: Vec<&'a str>,
}

#[derive(Serialize)]
struct CaseListView<'a> {
    suite: &'a str,
    cases: Vec<CaseListEntry<'a>>,
}

/// Renders reports for humans and machines
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    pub use_color: bool,
    pub timings: bool,
}

impl Reporter {
    pub fn new(use_color: bool, timings: bool) -> Self {
        Self { use_color, timings }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.use_color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn timing(&self, duration: Duration) -> String {
        if self.timings {
            format!(" ({}ms)", duration.as_millis())
        } else {
            String::new()
        }
    }

    /// Human-oriented summary with diffs for failing cases
    pub fn render_console(&self, report: &RunReport) -> String {
        let counts = report.counts();
        let mut out = String::new();

        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "TEST RESULTS: {} passed, {} failed, {} errors, {} total\n",
            counts.passed, counts.failed, counts.errors, counts.total
        ));
        out.push_str(RULE);
        out.push('\n');

        for suite in &report.suites {
            self.render_suite(&mut out, suite);
        }

        if !report.aborted.is_empty() {
            out.push('\n');
            out.push_str(&self.paint("Aborted suites:", |s| s.red().bold()));
            out.push('\n');
            for failure in &report.aborted {
                out.push_str(&format!(
                    "  {} {}: {}\n",
                    self.paint("✗", |s| s.red()),
                    failure.suite,
                    failure.error.message
                ));
            }
        }

        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        let not_passed = counts.failed + counts.errors;
        let verdict = match report.status() {
            Status::Pass => self.paint("✓ ALL TESTS PASSED", |s| s.green().bold()),
            _ if not_passed == 0 => {
                self.paint("✗ RUN INCOMPLETE: SUITES ABORTED", |s| s.red().bold())
            }
            _ => self.paint(&format!("✗ {} TEST(S) FAILED", not_passed), |s| {
                s.red().bold()
            }),
        };
        out.push_str(&verdict);
        out.push_str(&self.timing(report.duration));
        out.push('\n');
        out.push_str(RULE);
        out.push('\n');

        out
    }

    fn render_suite(&self, out: &mut String, suite: &SuiteReport) {
        out.push('\n');
        out.push_str(&format!(
            "{} {}\n",
            self.paint(&suite.suite, |s| s.bold()),
            self.paint(&format!("({})", suite.target), |s| s.dimmed())
        ));
        out.push_str(THIN_RULE);
        out.push('\n');

        for result in &suite.results {
            let timing = self.timing(result.duration);
            match result.status {
                Status::Pass if result.has_warnings() => {
                    let warnings = result.diffs.len();
                    out.push_str(&format!(
                        "  {} {}{} ({} warning{})\n",
                        self.paint("⚠", |s| s.yellow()),
                        result.case,
                        timing,
                        warnings,
                        if warnings == 1 { "" } else { "s" }
                    ));
                    for diff in &result.diffs {
                        out.push_str(&format!(
                            "      - {}\n",
                            self.paint(&diff.describe(), |s| s.yellow())
                        ));
                    }
                }
                Status::Pass => {
                    out.push_str(&format!(
                        "  {} {}{}\n",
                        self.paint("✓", |s| s.green()),
                        result.case,
                        timing
                    ));
                }
                Status::Fail => {
                    out.push_str(&format!(
                        "  {} {}{}\n",
                        self.paint("✗", |s| s.red()),
                        result.case,
                        timing
                    ));
                    out.push_str("    Differences:\n");
                    for diff in &result.diffs {
                        let line = if diff.is_failure() {
                            self.paint(&diff.describe(), |s| s.red())
                        } else {
                            self.paint(&format!("{} (warning)", diff.describe()), |s| {
                                s.yellow()
                            })
                        };
                        out.push_str(&format!("      - {}\n", line));
                    }
                }
                Status::Error => {
                    out.push_str(&format!(
                        "  {} {}{}\n",
                        self.paint("!", |s| s.red().bold()),
                        result.case,
                        timing
                    ));
                    if let Some(failure) = &result.failure {
                        out.push_str(&format!("    Error: {}\n", failure));
                    }
                }
            }
        }

        let counts = suite.counts;
        out.push_str(&format!(
            "  {} passed ({} with warnings), {} failed, {} errors{}\n",
            counts.passed,
            counts.passed_with_warnings,
            counts.failed,
            counts.errors,
            self.timing(suite.duration)
        ));
    }

    /// Structured form of a run
    pub fn render_json(&self, report: &RunReport) -> Result<String> {
        let view = RunView {
            status: report.status(),
            summary: report.counts(),
            suites: &report.suites,
            aborted: &report.aborted,
        };
        let mut value = serde_json::to_value(&view)?;

        if self.timings {
            value["duration_ms"] = duration_ms(report.duration);
            for (i, suite) in report.suites.iter().enumerate() {
                value["suites"][i]["duration_ms"] = duration_ms(suite.duration);
                for (j, result) in suite.results.iter().enumerate() {
                    value["suites"][i]["results"][j]["duration_ms"] = duration_ms(result.duration);
                }
            }
        }

        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Configured suites, one per line
    pub fn render_suite_list(&self, suites: &[SuiteSpec]) -> String {
        let mut out = String::from("Available suites:\n");
        for suite in suites {
            out.push_str(&format!(
                "  {:20} {:32} {}\n",
                self.paint(&suite.name, |s| s.bold()),
                suite.target.reference,
                self.paint(&suite.source.to_string(), |s| s.dimmed())
            ));
        }
        out
    }

    pub fn render_suite_list_json(&self, suites: &[SuiteSpec]) -> Result<String> {
        let entries: Vec<SuiteListEntry> = suites
            .iter()
            .map(|s| SuiteListEntry {
                name: &s.name,
                target: &s.target.id,
                callable: &s.target.reference,
                source: s.source.to_string(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Cases of a suite in discovery order
    pub fn render_case_list(&self, suite: &str, cases: &[Case]) -> String {
        let mut out = format!("{} cases:\n", suite);
        for case in cases {
            out.push_str(&format!("  {}\n", case.name));
        }
        out.push_str(&format!("{} case(s)\n", cases.len()));
        out
    }

    pub fn render_case_list_json(&self, suite: &str, cases: &[Case]) -> Result<String> {
        let view = CaseListView {
            suite,
            cases: cases
                .iter()
                .map(|c| CaseListEntry {
                    name: &c.name,
                    origin: c.origin.display().to_string(),
                    optional_fields: c.optional_fields.iter().map(String::as_str).collect(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }
}

fn duration_ms(duration: Duration) -> serde_json::Value {
    serde_json::Value::from(duration.as_millis() as u64)
}
