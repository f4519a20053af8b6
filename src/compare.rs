//! Comparison of captured output against resolved expectations
//!
//! A unit is one (test, profile, mode) triple. It resolves, executes and
//! compares exactly once, with no retries:
//! `NotRun -> Resolving -> Executing -> Comparing -> Done`.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::capture::{CancelToken, CapturedOutput, Executor};
use crate::common::Result;
use crate::expect::members::member_set;
use crate::expect::Mode;
use crate::profile::ProfileRegistry;
use crate::resolve::{resolve_entry, MatchedBy};
use crate::suite::TestCase;

/// Members present on only one side of a failed comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberDiff {
    /// Expected but not captured
    pub missing_from_captured: Vec<String>,
    /// Captured but not expected
    pub unexpected_in_captured: Vec<String>,
}

impl MemberDiff {
    /// Compute the symmetric difference of the two member sets
    pub fn between(expected: &str, captured: &str) -> Self {
        let expected = member_set(expected);
        let captured = member_set(captured);
        Self {
            missing_from_captured: expected.difference(&captured).cloned().collect(),
            unexpected_in_captured: captured.difference(&expected).cloned().collect(),
        }
    }

    /// True when both sides hold the same members, i.e. only order or
    /// alert boundaries differ
    pub fn is_empty(&self) -> bool {
        self.missing_from_captured.is_empty() && self.unexpected_in_captured.is_empty()
    }
}

/// Outcome of comparing one expected value with one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub captured: String,
    pub diff: Option<MemberDiff>,
}

/// Exact comparison of the expected value with the joined capture
pub fn compare(expected: &str, captured: &CapturedOutput) -> Verdict {
    let captured = captured.joined();
    if captured == expected {
        Verdict {
            passed: true,
            captured,
            diff: None,
        }
    } else {
        let diff = MemberDiff::between(expected, &captured);
        Verdict {
            passed: false,
            captured,
            diff: Some(diff),
        }
    }
}

/// Result of one unit, kept only for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub test: String,
    pub profile: String,
    pub mode: Mode,
    pub passed: bool,
    pub expected: String,
    pub captured: String,
    /// Key of the expectation entry that was used
    pub matched_key: String,
    pub matched_by: MatchedBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<MemberDiff>,
}

/// Lifecycle of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    NotRun,
    Resolving,
    Executing,
    Comparing,
    Done,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::NotRun => "not-run",
            UnitState::Resolving => "resolving",
            UnitState::Executing => "executing",
            UnitState::Comparing => "comparing",
            UnitState::Done => "done",
        };
        f.write_str(s)
    }
}

/// How a unit ended
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    Completed(ComparisonResult),
    /// Cancelled before or during execution; nothing was compared
    Cancelled {
        test: String,
        profile: String,
        mode: Mode,
    },
}

struct UnitTracker<'a> {
    test: &'a str,
    profile: &'a str,
    mode: Mode,
    state: UnitState,
}

impl<'a> UnitTracker<'a> {
    fn new(test: &'a str, profile: &'a str, mode: Mode) -> Self {
        Self {
            test,
            profile,
            mode,
            state: UnitState::NotRun,
        }
    }

    fn advance(&mut self, next: UnitState) {
        tracing::trace!(
            test = self.test,
            profile = self.profile,
            mode = %self.mode,
            "{} -> {}",
            self.state,
            next
        );
        self.state = next;
    }
}

/// Runs resolve, execute and compare for single units
#[derive(Debug, Clone)]
pub struct Comparator {
    registry: Arc<ProfileRegistry>,
    executor: Executor,
}

impl Comparator {
    pub fn new(registry: Arc<ProfileRegistry>, executor: Executor) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Run one unit to completion
    ///
    /// Only configuration errors are returned; engine faults arrive as the
    /// sentinel capture.
    pub async fn compare(
        &self,
        test: &TestCase,
        profile: &str,
        mode: Mode,
        cancel: &mut CancelToken,
    ) -> Result<UnitOutcome> {
        let mut unit = UnitTracker::new(&test.id, profile, mode);

        unit.advance(UnitState::Resolving);
        let resolution = resolve_entry(&test.id, &test.expectations, &self.registry, profile, mode)?;

        unit.advance(UnitState::Executing);
        let Some(captured) = self.executor.execute_cancellable(test, profile, cancel).await else {
            unit.advance(UnitState::Done);
            return Ok(UnitOutcome::Cancelled {
                test: test.id.clone(),
                profile: profile.to_string(),
                mode,
            });
        };

        unit.advance(UnitState::Comparing);
        let verdict = compare(resolution.value, &captured);
        unit.advance(UnitState::Done);

        if verdict.passed {
            tracing::debug!(test = %test.id, profile, mode = %mode, "Passed");
        } else {
            tracing::info!(test = %test.id, profile, mode = %mode, "Mismatch");
        }

        Ok(UnitOutcome::Completed(ComparisonResult {
            test: test.id.clone(),
            profile: profile.to_string(),
            mode,
            passed: verdict.passed,
            expected: resolution.value.to_string(),
            captured: verdict.captured,
            matched_key: resolution.key.to_string(),
            matched_by: resolution.matched_by,
            diff: verdict.diff,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FAULT_SENTINEL;
    use crate::common::Error;
    use crate::engine::{Engine, PageRequest};
    use crate::expect::Expectations;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_exact_match_passes() {
        let verdict = compare("a,b()", &CapturedOutput::new(vec!["a,b()".to_string()]));
        assert!(verdict.passed);
        assert!(verdict.diff.is_none());
    }

    #[test]
    fn test_missing_member_reported() {
        let verdict = compare("a,b(),c", &CapturedOutput::new(vec!["a,c".to_string()]));
        assert!(!verdict.passed);
        let diff = verdict.diff.unwrap();
        assert_eq!(diff.missing_from_captured, vec!["b()"]);
        assert!(diff.unexpected_in_captured.is_empty());
    }

    #[test]
    fn test_order_difference_fails_with_empty_diff() {
        let verdict = compare("a,b", &CapturedOutput::new(vec!["b,a".to_string()]));
        assert!(!verdict.passed);
        assert!(verdict.diff.unwrap().is_empty());
    }

    #[test]
    fn test_sentinel_matches_sentinel_expectation() {
        let verdict = compare(FAULT_SENTINEL, &CapturedOutput::sentinel());
        assert!(verdict.passed);
    }

    /// Engine returning canned output per profile, failing for others
    struct MapEngine(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl Engine for MapEngine {
        fn name(&self) -> &str {
            "map"
        }

        async fn run_page(&self, request: PageRequest<'_>) -> Result<Vec<String>> {
            self.0
                .get(request.profile)
                .map(|s| vec![s.to_string()])
                .ok_or_else(|| Error::EngineFailed("unsupported".to_string()))
        }
    }

    fn comparator(outputs: &[(&'static str, &'static str)]) -> Comparator {
        let engine = MapEngine(outputs.iter().copied().collect());
        Comparator::new(
            Arc::new(ProfileRegistry::builtin()),
            Executor::new(Arc::new(engine), Duration::from_secs(5)),
        )
    }

    fn test_case(target: &[(&str, &str)]) -> TestCase {
        TestCase {
            id: "t".to_string(),
            html: String::new(),
            expectations: Expectations::new(target.iter().copied().collect(), None),
        }
    }

    #[tokio::test]
    async fn test_engine_fault_expected_as_exception_passes() {
        let comparator = comparator(&[("CHROME", "a")]);
        let test = test_case(&[("default", "a"), ("IE", "exception")]);
        let mut cancel = CancelToken::never();

        let outcome = comparator
            .compare(&test, "IE", Mode::Target, &mut cancel)
            .await
            .unwrap();
        match outcome {
            UnitOutcome::Completed(result) => {
                assert!(result.passed);
                assert_eq!(result.captured, "exception");
                assert_eq!(result.matched_key, "IE");
                assert_eq!(result.matched_by, MatchedBy::Profile);
            }
            other => panic!("Expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_engine_fault_surfaces_as_mismatch() {
        let comparator = comparator(&[]);
        let test = test_case(&[("default", "a")]);
        let mut cancel = CancelToken::never();

        let outcome = comparator
            .compare(&test, "EDGE", Mode::Target, &mut cancel)
            .await
            .unwrap();
        let UnitOutcome::Completed(result) = outcome else {
            panic!("Expected Completed");
        };
        assert!(!result.passed);
        let diff = result.diff.unwrap();
        assert_eq!(diff.missing_from_captured, vec!["a"]);
        assert_eq!(diff.unexpected_in_captured, vec!["exception"]);
    }

    #[tokio::test]
    async fn test_missing_expectation_is_error() {
        let comparator = comparator(&[("IE", "a")]);
        let test = test_case(&[("CHROME", "a")]);
        let mut cancel = CancelToken::never();

        let err = comparator
            .compare(&test, "IE", Mode::Target, &mut cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingExpectation { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_unit_reports_cancelled() {
        let comparator = comparator(&[("IE", "a")]);
        let test = test_case(&[("default", "a")]);
        let (handle, mut cancel) = crate::capture::cancel_pair();
        handle.cancel();

        let outcome = comparator
            .compare(&test, "IE", Mode::Current, &mut cancel)
            .await
            .unwrap();
        assert!(matches!(outcome, UnitOutcome::Cancelled { mode: Mode::Current, .. }));
    }
}
