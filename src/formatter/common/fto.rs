//! Format transfer objects that are used by multiple formatters.

use std::time::Duration;

use crate::{
    formatter::*,
    outcome::{FixtureFailure, TestFailure, TestStatus, Verdict},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCount(pub usize);

impl From<FmtRunStart<'_>> for TestCount {
    fn from(value: FmtRunStart<'_>) -> Self {
        TestCount(value.tests)
    }
}

impl From<FmtEndListing> for TestCount {
    fn from(value: FmtEndListing) -> Self {
        TestCount(value.tests)
    }
}

/// The full `::`-joined name of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitName<'p>(pub &'p str);

impl<'p> From<FmtListTest<'p>> for UnitName<'p> {
    fn from(value: FmtListTest<'p>) -> Self {
        Self(&value.unit.name)
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RunOutcomes<'p> {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub filtered_out: usize,
    pub duration: Duration,
    pub failures: Vec<Failure<'p>>,
    pub fixture_failures: Vec<FixtureFailure>,
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Failure<'p> {
    pub name: &'p str,
    pub failure: TestFailure,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl<'p, 'o> From<FmtRunOutcomes<'p, 'o>> for RunOutcomes<'p> {
    fn from(value: FmtRunOutcomes<'p, 'o>) -> Self {
        let count = |verdict: Verdict| {
            value
                .outcomes
                .iter()
                .filter(|(_, outcome)| outcome.verdict() == verdict)
                .count()
        };

        Self {
            passed: count(Verdict::Ok),
            failed: count(Verdict::Fail),
            errored: count(Verdict::Error),
            filtered_out: value.filtered_out,
            duration: value.duration,
            failures: value
                .outcomes
                .iter()
                .filter_map(|(name, outcome)| {
                    let TestStatus::Failed(failure) = &outcome.status else {
                        return None;
                    };

                    Some(Failure {
                        name: *name,
                        failure: failure.clone(),
                        stdout: outcome.stdout.clone(),
                        stderr: outcome.stderr.clone(),
                    })
                })
                .collect(),
            fixture_failures: value.fixture_failures.to_vec(),
        }
    }
}
