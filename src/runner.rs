//! The executor.
//!
//! An [`Executor`] walks a [`Plan`] strictly sequentially. It runs fixtures
//! and tests on the calling thread, keeps the stack of open scopes together
//! with their failure state, and reports everything that happens to a
//! [`ReportSink`].
//!
//! It is driven either by the compiled event stream ([`Executor::step`],
//! [`Executor::run`]) or by the host, one unit at a time
//! ([`Executor::run_unit`]), in which case the scopes to exit and enter are
//! derived from the unit's scope chain.
//!
//! Failure semantics:
//!
//! - The first failing setup of a group stops that group's remaining setups.
//!   On a cascading group every unit below it fails without running, groups
//!   entered below it skip their setups and teardowns, and its own teardowns
//!   still run. On a non-cascading group only the group's own tests error.
//! - A failing test setup errors the test, which then runs neither its body
//!   nor its test teardowns. A failing test teardown turns a passing test
//!   into an error. Both trigger the cascade of a cascading group, which
//!   then skips its own teardowns.
//! - The first failing teardown of a group stops that group's remaining
//!   teardowns. Other groups are not affected.

use std::{mem, panic::AssertUnwindSafe, time::Instant};

use tracing::{debug, trace, warn};

use crate::{
    capture::{clear_output, take_output},
    compile::{Plan, PlanEvent, Scope, ScopeId, Transitions, Unit, UnitId, chain_transitions},
    context::Context,
    error::ExecError,
    outcome::{FixtureFailure, FixtureReport, FixtureStage, TestFailure, TestOutcome, TestStatus},
    panic_handler::{Handled, TestPanicHandler},
    params::Params,
    test::{Case, Fixture, TestResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finalizing,
    Done,
}

/// Something an [`Executor`] reports.
#[derive(Debug, Clone, Copy)]
pub enum ReportEvent<'p, 'o> {
    GroupEnter(&'p Scope),

    /// A group setup or teardown ran.
    Fixture {
        scope: &'p Scope,
        report: &'o FixtureReport,
    },

    TestStart(&'p Unit),

    TestOutcome {
        unit: &'p Unit,
        outcome: &'o TestOutcome,
    },

    GroupExit(&'p Scope),
}

pub trait ReportSink<'p> {
    fn report(&mut self, event: ReportEvent<'p, '_>);
}

impl<'p> ReportSink<'p> for () {
    fn report(&mut self, _: ReportEvent<'p, '_>) {}
}

impl<'p, F> ReportSink<'p> for F
where
    F: FnMut(ReportEvent<'p, '_>),
{
    fn report(&mut self, event: ReportEvent<'p, '_>) {
        self(event)
    }
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct RunResults {
    pub outcomes: Vec<(UnitId, TestOutcome)>,

    /// Group fixture failures, and test teardown failures of tests that had
    /// already failed.
    pub fixture_failures: Vec<FixtureFailure>,
}

#[derive(Debug)]
struct OpenScope {
    id: ScopeId,

    /// Teardowns are skipped: the scope was entered while an ancestor's
    /// cascade was active, or a test fixture started its cascade.
    suppressed: bool,
    setup_failure: Option<FixtureFailure>,
    cascade: Option<FixtureFailure>,
}

pub struct Executor<'p, S, P>
where
    S: ReportSink<'p>,
    P: TestPanicHandler,
{
    plan: &'p Plan,
    sink: S,
    panic_handler: P,
    state: RunState,
    open: Vec<OpenScope>,
    context: Context,
    results: RunResults,
}

impl<'p, S, P> Executor<'p, S, P>
where
    S: ReportSink<'p>,
    P: TestPanicHandler,
{
    pub fn new(plan: &'p Plan, sink: S, panic_handler: P) -> Self {
        Self {
            plan,
            sink,
            panic_handler,
            state: RunState::Idle,
            open: Vec::new(),
            context: Context::new(),
            results: RunResults::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The scopes currently open, outermost first.
    pub fn open_scopes(&self) -> impl ExactSizeIterator<Item = ScopeId> + '_ {
        self.open.iter().map(|s| s.id)
    }

    /// Execute the whole plan.
    pub fn run(mut self) -> Result<RunResults, ExecError> {
        let plan = self.plan;
        for event in plan.events() {
            self.step(*event)?;
        }
        Ok(self.finish())
    }

    pub fn step(&mut self, event: PlanEvent) -> Result<(), ExecError> {
        match event {
            PlanEvent::Enter(scope) => self.enter(scope),
            PlanEvent::Unit(unit) => self.unit(unit),
            PlanEvent::Exit(scope) => self.exit(scope),
        }
    }

    /// Execute a single unit, leaving and entering scopes as needed.
    pub fn run_unit(&mut self, id: UnitId) -> Result<(), ExecError> {
        self.begin()?;
        let plan = self.plan;
        let unit = plan
            .units()
            .get(id.0)
            .ok_or(ExecError::UnexpectedUnit { unit: id.0 })?;
        let current: Vec<_> = self.open_scopes().collect();
        let Transitions { exited, entered } = chain_transitions(&current, &unit.chain);
        for scope in exited {
            self.exit(scope)?;
        }
        for scope in entered {
            self.enter(scope)?;
        }
        self.unit(id)
    }

    /// Exit every scope still open, innermost first, and hand out the results.
    ///
    /// Called on drop if the host does not.
    pub fn finish(&mut self) -> RunResults {
        if self.state != RunState::Done {
            self.state = RunState::Finalizing;
            while let Some(open) = self.open.last() {
                let id = open.id;
                if self.exit(id).is_err() {
                    break;
                }
            }
            self.state = RunState::Done;
            debug!(
                units = self.results.outcomes.len(),
                fixture_failures = self.results.fixture_failures.len(),
                "run finished"
            );
        }
        mem::take(&mut self.results)
    }

    fn begin(&mut self) -> Result<(), ExecError> {
        match self.state {
            RunState::Idle => {
                debug!(units = self.plan.len(), "run started");
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running => Ok(()),
            RunState::Finalizing | RunState::Done => Err(ExecError::Finished),
        }
    }

    fn enter(&mut self, id: ScopeId) -> Result<(), ExecError> {
        self.begin()?;
        let plan = self.plan;
        let Some(scope) = plan.scopes().get(id.0) else {
            return Err(ExecError::UnexpectedEnter { scope: id.0 });
        };
        if scope.parent != self.open.last().map(|s| s.id) {
            return Err(ExecError::UnexpectedEnter { scope: id.0 });
        }

        if scope.is_root() {
            self.context = Context::new();
        }
        self.sink.report(ReportEvent::GroupEnter(scope));

        if self.open.iter().any(|s| s.cascade.is_some()) {
            debug!(group = %scope.name, "cascading failure in progress, not setting up group");
            self.open.push(OpenScope {
                id,
                suppressed: true,
                setup_failure: None,
                cascade: None,
            });
            return Ok(());
        }

        debug!(group = %scope.name, "setting up group");
        let setups = scope.node().setups();
        let mut setup_failure = None;
        for (i, fixture) in setups.iter().enumerate() {
            let report =
                self.group_fixture(scope, FixtureStage::Setup, i, setups.len(), fixture, scope.params());
            self.sink.report(ReportEvent::Fixture {
                scope,
                report: &report,
            });
            if let Some(failure) = report.failure {
                self.results.fixture_failures.push(failure.clone());
                setup_failure = Some(failure);
                break;
            }
        }

        let cascade = setup_failure.clone().filter(|_| scope.cascading);
        if cascade.is_some() {
            warn!(group = %scope.name, "triggering cascading failure");
        }
        self.open.push(OpenScope {
            id,
            suppressed: false,
            setup_failure,
            cascade,
        });
        Ok(())
    }

    fn exit(&mut self, id: ScopeId) -> Result<(), ExecError> {
        if self.state == RunState::Done {
            return Err(ExecError::Finished);
        }
        if self.open.last().map(|s| s.id) != Some(id) {
            return Err(ExecError::UnexpectedExit { scope: id.0 });
        }
        let Some(open) = self.open.pop() else {
            return Err(ExecError::UnexpectedExit { scope: id.0 });
        };

        let plan = self.plan;
        let scope = plan.scope(id);
        match open.suppressed {
            true => debug!(group = %scope.name, "cascading failure in progress, not tearing down group"),
            false => {
                debug!(group = %scope.name, "tearing down group");
                let teardowns = scope.node().teardowns();
                for (i, fixture) in teardowns.iter().enumerate() {
                    let report = self.group_fixture(
                        scope,
                        FixtureStage::Teardown,
                        i,
                        teardowns.len(),
                        fixture,
                        &Params::None,
                    );
                    self.sink.report(ReportEvent::Fixture {
                        scope,
                        report: &report,
                    });
                    if let Some(failure) = report.failure {
                        self.results.fixture_failures.push(failure);
                        break;
                    }
                }
            }
        }

        self.sink.report(ReportEvent::GroupExit(scope));
        Ok(())
    }

    fn unit(&mut self, id: UnitId) -> Result<(), ExecError> {
        self.begin()?;
        let plan = self.plan;
        let Some(unit) = plan.units().get(id.0) else {
            return Err(ExecError::UnexpectedUnit { unit: id.0 });
        };
        if !self.open_scopes().eq(unit.chain.iter().copied()) {
            return Err(ExecError::UnexpectedUnit { unit: id.0 });
        }

        self.sink.report(ReportEvent::TestStart(unit));
        clear_output();
        let now = Instant::now();

        let cascade = self
            .open
            .iter()
            .filter(|s| unit.cascading_ancestors.contains(&s.id))
            .find_map(|s| s.cascade.clone());
        let setup_failure = self
            .open
            .last()
            .and_then(|s| s.setup_failure.clone());
        let status = match (cascade, setup_failure) {
            (Some(origin), _) => {
                debug!(name = %unit.name, "cascading failure in progress, not running test");
                TestStatus::Failed(TestFailure::Cascade(origin))
            }
            (None, Some(failure)) => TestStatus::Failed(TestFailure::Fixture(failure)),
            (None, None) => self.run_test(unit),
        };

        let duration = now.elapsed();
        let output = take_output();
        let outcome = TestOutcome {
            status,
            duration,
            stdout: output.stdout,
            stderr: output.stderr,
        };
        debug!(name = %unit.name, verdict = %outcome.verdict(), "unit finished");
        self.sink.report(ReportEvent::TestOutcome {
            unit,
            outcome: &outcome,
        });
        self.results.outcomes.push((id, outcome));
        Ok(())
    }

    fn run_test(&mut self, unit: &'p Unit) -> TestStatus {
        let plan = self.plan;
        let scope = plan.scope(unit.scope);
        let node = scope.node();

        let test_setups = node.test_setups();
        for (i, fixture) in test_setups.iter().enumerate() {
            if let Err(message) = self.call_fixture(fixture, &Params::None) {
                let failure = self.test_fixture_failure(
                    scope,
                    FixtureStage::TestSetup,
                    fixture_label(fixture, FixtureStage::TestSetup, i, test_setups.len()),
                    message,
                );
                return TestStatus::Failed(TestFailure::Fixture(failure));
            }
        }

        trace!(name = %unit.name, "running test");
        let root = unit.chain.first().map_or(scope, |root| plan.scope(*root));
        let asserts = root.asserts();
        let ctx = &mut self.context;
        let handled = self.panic_handler.handle(AssertUnwindSafe(|| {
            let mut case = Case::new(ctx, asserts, unit.description());
            unit.test.call(&mut case)
        }));
        let mut status = match handled {
            Handled::Returned(TestResult(Ok(()))) => TestStatus::Passed,
            Handled::Returned(TestResult(Err(err))) => TestStatus::Failed(TestFailure::from_error(err)),
            Handled::Panicked(message) => TestStatus::Failed(TestFailure::Panicked(message)),
        };

        let test_teardowns = node.test_teardowns();
        for (i, fixture) in test_teardowns.iter().enumerate() {
            if let Err(message) = self.call_fixture(fixture, &Params::None) {
                let failure = self.test_fixture_failure(
                    scope,
                    FixtureStage::TestTeardown,
                    fixture_label(fixture, FixtureStage::TestTeardown, i, test_teardowns.len()),
                    message,
                );
                match status {
                    TestStatus::Passed => status = TestStatus::Failed(TestFailure::Fixture(failure)),
                    TestStatus::Failed(_) => self.results.fixture_failures.push(failure),
                }
                break;
            }
        }

        status
    }

    fn test_fixture_failure(
        &mut self,
        scope: &Scope,
        stage: FixtureStage,
        label: String,
        message: String,
    ) -> FixtureFailure {
        warn!(group = %scope.name, %label, %message, "{stage} failed");
        let failure = FixtureFailure::new(stage, label, scope.name.clone(), message);
        if scope.cascading
            && let Some(open) = self.open.last_mut()
        {
            warn!(group = %scope.name, "triggering cascading failure");
            open.cascade.get_or_insert_with(|| failure.clone());
            open.suppressed = true;
        }
        failure
    }

    fn group_fixture(
        &mut self,
        scope: &Scope,
        stage: FixtureStage,
        index: usize,
        count: usize,
        fixture: &Fixture,
        params: &Params,
    ) -> FixtureReport {
        let label = fixture_label(fixture, stage, index, count);
        trace!(group = %scope.name, %label, "running {stage}");
        let failure = self.call_fixture(fixture, params).err().map(|message| {
            warn!(group = %scope.name, %label, %message, "{stage} failed");
            FixtureFailure::new(stage, label.clone(), scope.name.clone(), message)
        });

        FixtureReport {
            stage,
            label,
            described: fixture.description.is_some(),
            position: index + 1,
            count,
            failure,
        }
    }

    fn call_fixture(&mut self, fixture: &Fixture, params: &Params) -> Result<(), String> {
        let ctx = &mut self.context;
        match self
            .panic_handler
            .handle(AssertUnwindSafe(|| fixture.call(ctx, params)))
        {
            Handled::Returned(TestResult(Ok(()))) => Ok(()),
            Handled::Returned(TestResult(Err(err))) => Err(err.to_string()),
            Handled::Panicked(message) => Err(message),
        }
    }
}

impl<'p, S, P> Drop for Executor<'p, S, P>
where
    S: ReportSink<'p>,
    P: TestPanicHandler,
{
    fn drop(&mut self) {
        self.finish();
    }
}

fn fixture_label(fixture: &Fixture, stage: FixtureStage, index: usize, count: usize) -> String {
    match &fixture.description {
        Some(description) => description.to_string(),
        None => format!("{stage} ({}/{count})", index + 1),
    }
}
