//! Bounded-parallel suite execution
//!
//! Suites run one after another in the order given. Cases of a suite are
//! dispatched onto blocking workers, at most `max_workers` at a time across
//! the whole run, and their results are put back into discovery order.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::common::ErrorSummary;
use crate::comparator::compare;
use crate::config::{Settings, SuiteSpec, TargetSpec};
use crate::discovery::{self, Case};
use crate::executor::{self, FailureKind, InvocationFailure};
use crate::report::{ExecutionResult, RunReport, Status, SuiteFailure, SuiteReport};

/// Executes suites with a bounded worker pool
#[derive(Debug, Clone)]
pub struct Runner {
    settings: Settings,
}

impl Runner {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run the given suites, optionally restricted to a case-name prefix
    ///
    /// A suite whose cases cannot be discovered is recorded as aborted and
    /// the remaining suites still run.
    pub async fn run(&self, suites: &[SuiteSpec], case_filter: Option<&str>) -> RunReport {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
        let mut report = RunReport::default();

        for suite in suites {
            let span = tracing::info_span!("suite", name = %suite.name);

            let cases = match span.in_scope(|| discovery::discover(suite)) {
                Ok(cases) => cases,
                Err(e) => {
                    tracing::warn!("Suite '{}' aborted: {}", suite.name, e);
                    report.aborted.push(SuiteFailure {
                        suite: suite.name.clone(),
                        error: ErrorSummary::from(&e),
                    });
                    continue;
                }
            };

            let cases = match case_filter {
                Some(prefix) => discovery::filter(cases, prefix),
                None => cases,
            };

            let suite_report = self
                .run_suite(suite, cases, &semaphore)
                .instrument(span)
                .await;
            report.suites.push(suite_report);
        }

        report.duration = started.elapsed();
        report
    }

    async fn run_suite(
        &self,
        suite: &SuiteSpec,
        cases: Vec<Case>,
        semaphore: &Arc<Semaphore>,
    ) -> SuiteReport {
        let started = Instant::now();
        tracing::info!(
            "Running {} cases with up to {} workers",
            cases.len(),
            self.settings.max_workers
        );

        let names: Vec<String> = cases.iter().map(|c| c.name.clone()).collect();
        let mut tasks = JoinSet::new();

        for (index, case) in cases.into_iter().enumerate() {
            let target = Arc::clone(&suite.target);
            let semaphore = Arc::clone(semaphore);

            tasks.spawn(
                async move {
                    let name = case.name.clone();
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return (index, internal_failure(name, e.to_string())),
                    };

                    let outcome =
                        tokio::task::spawn_blocking(move || execute_case(&target, &case)).await;

                    match outcome {
                        Ok(result) => (index, result),
                        Err(e) => (index, internal_failure(name, e.to_string())),
                    }
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<ExecutionResult>> = names.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Case task failed to complete: {}", e),
            }
        }

        let results: Vec<ExecutionResult> = names
            .into_iter()
            .zip(slots)
            .map(|(name, slot)| {
                slot.unwrap_or_else(|| internal_failure(name, "case task did not complete".to_string()))
            })
            .collect();

        let report = SuiteReport::new(&suite.name, &suite.target.reference, results, started.elapsed());
        tracing::info!(
            "Suite finished: {} passed, {} failed, {} errors",
            report.counts.passed,
            report.counts.failed,
            report.counts.errors
        );
        report
    }
}

/// Invoke the target for one case and grade its output
fn execute_case(target: &TargetSpec, case: &Case) -> ExecutionResult {
    let started = Instant::now();

    let result = match executor::invoke(&*target.bound, &case.input) {
        Ok(actual) => {
            let comparison = compare(&case.expected, &actual, &case.optional_fields);
            ExecutionResult {
                case: case.name.clone(),
                status: comparison.status,
                actual: Some(actual),
                diffs: comparison.diffs,
                failure: None,
                duration: started.elapsed(),
            }
        }
        Err(failure) => ExecutionResult {
            case: case.name.clone(),
            status: Status::Error,
            actual: None,
            diffs: Vec::new(),
            failure: Some(failure),
            duration: started.elapsed(),
        },
    };

    tracing::debug!(case = %result.case, status = %result.status, "Case finished");
    result
}

fn internal_failure(case: String, message: String) -> ExecutionResult {
    ExecutionResult {
        case,
        status: Status::Error,
        actual: None,
        diffs: Vec::new(),
        failure: Some(InvocationFailure {
            kind: FailureKind::Panic,
            message,
        }),
        duration: Default::default(),
    }
}
