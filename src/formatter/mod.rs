//! Formatting of runs and listings.
//!
//! A formatter does not receive the executor's events directly. For every
//! call it declares an associated data type that is built from the
//! corresponding `Fmt*` struct via [`From`]. This way a formatter only pulls
//! out the parts it needs, and those parts can be moved to the formatter
//! thread while the executor continues with the next unit.
//!
//! Calls a formatter is not interested in can use `()` as their data type,
//! the default method implementations then do nothing.

use std::time::Duration;

use crate::{
    compile::{Plan, Scope, Unit},
    outcome::{FixtureFailure, FixtureReport, TestOutcome},
    report::TestOutcomes,
};

pub mod common;
pub mod no;
pub mod pretty;
pub mod terse;

#[derive(Debug, Clone, Copy)]
pub struct FmtRunStart<'p> {
    pub plan: &'p Plan,
    pub tests: usize,
    pub filtered_out: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtGroupEnter<'p> {
    pub scope: &'p Scope,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtFixture<'p, 'o> {
    pub scope: &'p Scope,
    pub report: &'o FixtureReport,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtTestStart<'p> {
    pub scope: &'p Scope,
    pub unit: &'p Unit,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtTestOutcome<'p, 'o> {
    pub scope: &'p Scope,
    pub unit: &'p Unit,
    pub outcome: &'o TestOutcome,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtGroupExit<'p> {
    pub scope: &'p Scope,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtRunOutcomes<'p, 'o> {
    pub outcomes: &'o TestOutcomes<'p>,
    pub fixture_failures: &'o [FixtureFailure],
    pub filtered_out: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtBeginListing {
    pub tests: usize,
    pub filtered_out: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtListGroup<'p> {
    pub scope: &'p Scope,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtListTest<'p> {
    pub scope: &'p Scope,
    pub unit: &'p Unit,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtEndListing {
    pub tests: usize,
}

pub trait TestFormatter<'p>: Send {
    type Error: Send + 'p;

    type RunStart: From<FmtRunStart<'p>>;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type GroupEnter: From<FmtGroupEnter<'p>> + Send;
    fn fmt_group_enter(&mut self, data: Self::GroupEnter) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type Fixture: for<'o> From<FmtFixture<'p, 'o>> + Send;
    fn fmt_fixture(&mut self, data: Self::Fixture) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type TestStart: From<FmtTestStart<'p>> + Send;
    fn fmt_test_start(&mut self, data: Self::TestStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type TestOutcome: for<'o> From<FmtTestOutcome<'p, 'o>> + Send;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type GroupExit: From<FmtGroupExit<'p>> + Send;
    fn fmt_group_exit(&mut self, data: Self::GroupExit) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type RunOutcomes: for<'o> From<FmtRunOutcomes<'p, 'o>>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

pub trait TestListFormatter<'p> {
    type Error: 'p;

    type BeginListing: From<FmtBeginListing>;
    fn fmt_begin_listing(&mut self, data: Self::BeginListing) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type ListGroup: From<FmtListGroup<'p>>;
    fn fmt_list_group(&mut self, data: Self::ListGroup) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type ListTest: From<FmtListTest<'p>>;
    fn fmt_list_test(&mut self, data: Self::ListTest) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type EndListing: From<FmtEndListing>;
    fn fmt_end_listing(&mut self, data: Self::EndListing) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

/// Name of the formatter call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatError(pub &'static str);

macro_rules! named_fmt {
    ($formatter:ident . $method:ident ( $($arg:tt)* )) => {
        (
            $crate::formatter::FormatError(::std::stringify!($method)),
            $formatter.$method($($arg)*),
        )
    };
}

pub(crate) use named_fmt;

pub(crate) trait FmtErrors<E> {
    fn push_on_error(&mut self, named: (FormatError, Result<(), E>));
}

impl<E> FmtErrors<E> for Vec<(FormatError, E)> {
    fn push_on_error(&mut self, (name, result): (FormatError, Result<(), E>)) {
        if let Err(err) = result {
            self.push((name, err));
        }
    }
}
