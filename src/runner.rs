//! Suite driver
//!
//! Expands the cross product of tests, profiles and modes into independent
//! units and runs them on the tokio runtime, at most `jobs` at a time.
//! Units complete in any order; the report sorts them afterwards.

use futures_util::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};

use crate::capture::CancelToken;
use crate::common::{Error, Result};
use crate::compare::{Comparator, UnitOutcome};
use crate::expect::Mode;
use crate::report::Report;
use crate::suite::{Suite, TestId};

/// What to run
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Restrict to these test ids; all tests when empty
    pub tests: Vec<String>,
    /// Restrict to these profiles; all registered profiles when empty
    pub profiles: Vec<String>,
    /// Modes to check
    pub modes: Vec<Mode>,
    /// Maximum number of concurrently executing units
    pub jobs: usize,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            tests: Vec::new(),
            profiles: Vec::new(),
            modes: vec![Mode::Target],
            jobs: 1,
        }
    }
}

/// One (test, profile, mode) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub test: TestId,
    pub profile: String,
    pub mode: Mode,
}

/// Spawned unit that is aborted when dropped
///
/// Leaving the run early drops the pending stream, and with it every unit
/// still executing, so no engine process outlives the run.
struct UnitTask(JoinHandle<Result<UnitOutcome>>);

impl Future for UnitTask {
    type Output = std::result::Result<Result<UnitOutcome>, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl Drop for UnitTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Expand a plan into units, in test, profile, mode order
pub fn plan_units(suite: &Suite, plan: &RunPlan) -> Result<Vec<Unit>> {
    let tests: Vec<TestId> = if plan.tests.is_empty() {
        suite.test_ids().collect()
    } else {
        plan.tests
            .iter()
            .map(|id| suite.find(id).map(|(tid, _)| tid))
            .collect::<Result<_>>()?
    };

    let registry = suite.registry();
    let profiles: Vec<String> = if plan.profiles.is_empty() {
        registry.profiles().iter().map(|p| p.id.clone()).collect()
    } else {
        for id in &plan.profiles {
            if !registry.contains(id) {
                return Err(Error::UnknownProfile(id.clone()));
            }
        }
        plan.profiles.clone()
    };

    if plan.modes.is_empty() {
        return Err(Error::Config("At least one mode must be selected".to_string()));
    }

    let mut units = Vec::with_capacity(tests.len() * profiles.len() * plan.modes.len());
    for &test in &tests {
        for profile in &profiles {
            for &mode in &plan.modes {
                units.push(Unit {
                    test,
                    profile: profile.clone(),
                    mode,
                });
            }
        }
    }
    Ok(units)
}

/// Run every unit of the plan and collect a report
///
/// The suite is validated before any unit starts, so configuration defects
/// never surface halfway through a run. Cancellation is cooperative:
/// in-flight executions are dropped and every remaining unit is reported as
/// cancelled.
pub async fn run(
    suite: Arc<Suite>,
    comparator: Comparator,
    plan: &RunPlan,
    cancel: CancelToken,
    progress: Option<ProgressBar>,
) -> Result<Report> {
    suite.validate()?;
    let units = plan_units(&suite, plan)?;
    let jobs = plan.jobs.max(1);

    tracing::info!(
        suite = %suite.name,
        units = units.len(),
        jobs,
        "Starting run"
    );
    if let Some(pb) = &progress {
        pb.set_length(units.len() as u64);
    }

    let mut outcomes = stream::iter(units)
        .map(|unit| {
            let suite = Arc::clone(&suite);
            let comparator = comparator.clone();
            let mut cancel = cancel.clone();
            UnitTask(tokio::spawn(async move {
                let test = suite.get(unit.test);
                comparator
                    .compare(test, &unit.profile, unit.mode, &mut cancel)
                    .await
            }))
        })
        .buffer_unordered(jobs);

    let mut report = Report::new(&suite.name);
    while let Some(joined) = outcomes.next().await {
        let outcome = joined.map_err(|e| Error::Internal(format!("unit task failed: {}", e)))??;
        if let Some(pb) = &progress {
            pb.inc(1);
            if let UnitOutcome::Completed(result) = &outcome {
                if !result.passed {
                    pb.set_message(format!("last failure: {} on {}", result.test, result.profile));
                }
            }
        }
        report.push(outcome);
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    report.finish();
    tracing::info!(
        passed = report.summary().passed,
        failed = report.summary().failed,
        cancelled = report.summary().cancelled,
        "Run finished"
    );
    Ok(report)
}
