use std::{
    process::{ExitCode, Termination},
    time::Duration,
};

use crate::{
    formatter::FormatError,
    outcome::{FixtureFailure, TestOutcome},
};

pub type TestOutcomes<'p> = Vec<(&'p str, TestOutcome)>;

#[derive(Debug)]
#[non_exhaustive]
pub struct TestReport<FmtError> {
    /// Outcomes by full unit name, in execution order.
    pub outcomes: Vec<(String, TestOutcome)>,
    pub fixture_failures: Vec<FixtureFailure>,
    pub duration: Duration,
    pub fmt_errors: Vec<(FormatError, FmtError)>,
}

impl<FmtError> TestReport<FmtError> {
    /// Whether any unit did not pass or any fixture failed.
    pub fn failed(&self) -> bool {
        !self.fixture_failures.is_empty() || self.outcomes.iter().any(|(_, o)| o.failed())
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes
            .iter()
            .find_map(|(n, outcome)| (n == name).then_some(outcome))
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.failed() {
            true => ExitCode::FAILURE,
            false => ExitCode::SUCCESS,
        }
    }
}

impl<FmtError> Termination for TestReport<FmtError> {
    fn report(self) -> ExitCode {
        self.exit_code()
    }
}
