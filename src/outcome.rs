use std::{fmt::Display, time::Duration};

use thiserror::Error;

use crate::error::BoxError;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TestOutcome {
    pub status: TestStatus,
    pub duration: Duration,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn failed(&self) -> bool {
        self.status.failed()
    }

    pub fn verdict(&self) -> Verdict {
        self.status.verdict()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestStatus {
    Passed,
    Failed(TestFailure),
}

impl TestStatus {
    pub fn passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self, TestStatus::Failed(_))
    }

    pub fn verdict(&self) -> Verdict {
        match self {
            TestStatus::Passed => Verdict::Ok,
            TestStatus::Failed(failure) => failure.verdict(),
        }
    }
}

/// How a unit ended up, as printed after ` ... `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Ok,
    Fail,
    Error,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verdict::Ok => "ok",
            Verdict::Fail => "FAIL",
            Verdict::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestFailure {
    /// The test returned an [`AssertionFailure`](crate::test::AssertionFailure).
    Assertion(String),

    Panicked(String),

    /// The test returned any other error.
    Error(String),

    /// A fixture the test depends on failed, the test did not (fully) run.
    Fixture(FixtureFailure),

    /// A cascading failure of an enclosing group; the test did not run.
    Cascade(FixtureFailure),
}

impl TestFailure {
    pub fn verdict(&self) -> Verdict {
        match self {
            TestFailure::Assertion(_) | TestFailure::Panicked(_) | TestFailure::Cascade(_) => {
                Verdict::Fail
            }
            TestFailure::Error(_) | TestFailure::Fixture(_) => Verdict::Error,
        }
    }

    pub(crate) fn from_error(err: BoxError) -> Self {
        match err.downcast::<crate::test::AssertionFailure>() {
            Ok(failure) => TestFailure::Assertion(failure.message),
            Err(err) => TestFailure::Error(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureStage {
    Setup,
    Teardown,
    TestSetup,
    TestTeardown,
}

impl FixtureStage {
    /// Whether the fixture belongs to the group rather than to a test.
    pub fn is_group_level(self) -> bool {
        matches!(self, FixtureStage::Setup | FixtureStage::Teardown)
    }
}

impl Display for FixtureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FixtureStage::Setup => "setup",
            FixtureStage::Teardown => "teardown",
            FixtureStage::TestSetup => "test setup",
            FixtureStage::TestTeardown => "test teardown",
        })
    }
}

/// A setup, teardown, test setup or test teardown that returned an error or
/// panicked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} {label:?} of {group:?} failed: {message}")]
#[non_exhaustive]
pub struct FixtureFailure {
    pub stage: FixtureStage,

    /// The fixture's description, or `setup (i/N)` style position.
    pub label: String,

    /// Full name of the scope the fixture ran for.
    pub group: String,

    pub message: String,
}

impl FixtureFailure {
    pub fn new(
        stage: FixtureStage,
        label: impl Into<String>,
        group: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            label: label.into(),
            group: group.into(),
            message: message.into(),
        }
    }
}

/// A group level fixture that ran, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct FixtureReport {
    pub stage: FixtureStage,
    pub label: String,
    pub described: bool,

    /// 1-based position among the group's fixtures of this stage.
    pub position: usize,
    pub count: usize,

    pub failure: Option<FixtureFailure>,
}

impl FixtureReport {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}
