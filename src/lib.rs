//! Hierarchical test groups with shared fixtures.
//!
//! Tests are organized into a tree of [`Group`]s. Groups carry setups and
//! teardowns that run once around everything below them, test setups and
//! teardowns that run around each of their own tests, and a [`Context`] that
//! fixtures and tests share. Group trees are compiled into a
//! [`Plan`](compile::Plan) and walked by the [`Executor`](runner::Executor),
//! which reports to a formatter running on its own thread.
//!
//! Most users only need the [`prelude`] and [`harness`].

pub mod builder;
pub mod capture;
pub mod compile;
pub mod context;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod group;
pub mod outcome;
pub mod panic_handler;
pub mod params;
pub mod runner;

mod harness;
pub use harness::*;

mod report;
pub use report::*;

#[cfg(test)]
mod test_support;

pub use builder::{GroupBuilder, GroupOptions, GroupScope};
pub use context::Context;
pub use error::{BoxError, BuildError, HarnessError};
pub use group::Group;
pub use linkme;

pub mod prelude {
    pub use crate::{
        Suite, TestReport,
        builder::{GroupBuilder, GroupOptions},
        context::Context,
        error::{BoxError, BuildError, HarnessError},
        group::Group,
        params::{ParamSets, ParamValue, Params},
        test::{AssertionFailure, Case, Fixture, TestResult},
    };
}
