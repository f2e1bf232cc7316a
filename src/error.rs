//! Errors raised while building and compiling group trees.
//!
//! These errors are fatal: a tree that fails to build or compile never runs.
//! Errors raised while *running* fixtures and tests are not represented here,
//! they become part of a unit's [`TestStatus`](crate::outcome::TestStatus) or
//! a [`FixtureFailure`](crate::outcome::FixtureFailure) instead.

use thiserror::Error;

/// Boxed error type returned by user fixtures and tests.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error that aborts building or compiling a group tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// A fixture, test, include or combine was registered while no group was open.
    #[error("cannot register {what}: no group is open")]
    NoActiveGroup { what: &'static str },

    /// Malformed parameters or an otherwise invalid tree layout.
    #[error("invalid group configuration: {0}")]
    Configuration(String),

    /// A group (transitively) contains itself.
    #[error("group {description:?} includes itself")]
    CyclicStructure { description: String },

    /// A group scope was closed while a nested scope was still open,
    /// or the builder was finished with open scopes.
    #[error("group scopes were closed out of order")]
    UnbalancedScope,
}

impl BuildError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// An event handed to the [`Executor`](crate::runner::Executor) out of order.
///
/// Plans produced by [`compile`](crate::compile::compile) never cause these,
/// only hosts driving the executor by hand can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExecError {
    #[error("the executor already finished")]
    Finished,

    #[error("scope #{scope} is not a child of the innermost open scope")]
    UnexpectedEnter { scope: usize },

    #[error("scope #{scope} is not the innermost open scope")]
    UnexpectedExit { scope: usize },

    #[error("unit #{unit} does not belong to the open scopes")]
    UnexpectedUnit { unit: usize },
}

/// Why [`TreeHarness::run`](crate::TreeHarness::run) could not run a suite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HarnessError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}
