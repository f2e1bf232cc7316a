//! Running and listing suites.
//!
//! ```no_run
//! use grovetest::prelude::*;
//!
//! fn arithmetic() -> Result<Group, BuildError> {
//!     Group::build("Arithmetic", |g| {
//!         g.test("adds", || assert_eq!(1 + 1, 2))?;
//!         Ok(())
//!     })
//! }
//!
//! fn main() -> Result<TestReport<std::io::Error>, HarnessError> {
//!     let suite = Suite::new().with(arithmetic()?);
//!     grovetest::harness(&suite).run()
//! }
//! ```

use std::{io, panic, thread, time::Instant};

use tracing::debug;

use crate::{
    capture::CapturePanicHookGuard,
    compile::{Plan, PlanEvent, compile},
    error::{BuildError, HarnessError},
    filter::{DefaultFilter, TestFilter},
    formatter::{pretty::PrettyFormatter, *},
    group::Group,
    outcome::FixtureFailure,
    panic_handler::{DefaultPanicHandler, TestPanicHandler},
    report::{TestOutcomes, TestReport},
    runner::{Executor, ReportEvent},
};

/// Group factories registered at link time.
///
/// ```ignore
/// #[linkme::distributed_slice(grovetest::GROUPS)]
/// fn database() -> Result<Group, BuildError> {
///     Group::build("Database", |g| { /* ... */ Ok(()) })
/// }
/// ```
#[linkme::distributed_slice]
pub static GROUPS: [fn() -> Result<Group, BuildError>];

/// The root groups of a run.
#[derive(Debug, Default, Clone)]
pub struct Suite {
    groups: Vec<Group>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every group registered in [`GROUPS`].
    pub fn discover() -> Result<Self, BuildError> {
        let groups = GROUPS
            .iter()
            .map(|factory| factory())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(groups = groups.len(), "discovered groups");
        Ok(Self { groups })
    }

    pub fn add(&mut self, group: Group) -> &mut Self {
        self.groups.push(group);
        self
    }

    pub fn with(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Compile the suite without running it.
    pub fn compile<F: TestFilter + ?Sized>(&self, filter: &F) -> Result<Plan, BuildError> {
        compile(&self.groups, filter)
    }
}

pub fn harness(
    suite: &Suite,
) -> TreeHarness<'_, DefaultFilter, DefaultPanicHandler, PrettyFormatter<io::Stdout>> {
    TreeHarness {
        suite,
        filter: DefaultFilter::default(),
        panic_handler: DefaultPanicHandler,
        formatter: PrettyFormatter::default(),
    }
}

pub struct TreeHarness<'s, Filter, PanicHandler, Formatter> {
    pub(crate) suite: &'s Suite,
    pub(crate) filter: Filter,
    pub(crate) panic_handler: PanicHandler,
    pub(crate) formatter: Formatter,
}

/// Formatter input crossing over to the formatter thread.
enum FmtData<'p, F: TestFormatter<'p>> {
    GroupEnter(F::GroupEnter),
    Fixture(F::Fixture),
    TestStart(F::TestStart),
    TestOutcome(F::TestOutcome),
    GroupExit(F::GroupExit),
}

const FORMAT_BUFFER: usize = 16;

impl<'s, Filter, PanicHandler, Formatter> TreeHarness<'s, Filter, PanicHandler, Formatter>
where
    Filter: TestFilter,
    PanicHandler: TestPanicHandler,
{
    pub fn run<E>(self) -> Result<TestReport<E>, HarnessError>
    where
        Formatter: for<'p> TestFormatter<'p, Error = E>,
    {
        let now = Instant::now();
        let plan = self.suite.compile(&self.filter)?;

        let _hook = CapturePanicHookGuard::install();
        let (outcomes, fixture_failures, fmt_errors, duration) =
            run_plan(&plan, self.panic_handler, self.formatter, now)?;

        Ok(TestReport {
            outcomes: outcomes
                .into_iter()
                .map(|(name, outcome)| (name.to_string(), outcome))
                .collect(),
            fixture_failures,
            duration,
            fmt_errors,
        })
    }
}

type PlanRun<'p, E> = (
    TestOutcomes<'p>,
    Vec<FixtureFailure>,
    Vec<(FormatError, E)>,
    std::time::Duration,
);

fn run_plan<'p, P, F>(
    plan: &'p Plan,
    panic_handler: P,
    mut formatter: F,
    now: Instant,
) -> Result<PlanRun<'p, F::Error>, HarnessError>
where
    P: TestPanicHandler,
    F: TestFormatter<'p>,
{
    let mut fmt_errors = Vec::new();
    fmt_errors.push_on_error(named_fmt!(
        formatter.fmt_run_start(
            FmtRunStart {
                plan,
                tests: plan.len(),
                filtered_out: plan.filtered_out(),
            }
            .into()
        )
    ));

    let (results, mut formatter, mut fmt_errors) = thread::scope(move |thread_scope| {
        let (ftx, frx) = crossbeam_channel::bounded::<FmtData<'p, F>>(FORMAT_BUFFER);
        let fmt_thread = thread_scope.spawn(move || {
            while let Ok(fmt_data) = frx.recv() {
                fmt_errors.push_on_error(match fmt_data {
                    FmtData::GroupEnter(data) => named_fmt!(formatter.fmt_group_enter(data)),
                    FmtData::Fixture(data) => named_fmt!(formatter.fmt_fixture(data)),
                    FmtData::TestStart(data) => named_fmt!(formatter.fmt_test_start(data)),
                    FmtData::TestOutcome(data) => named_fmt!(formatter.fmt_test_outcome(data)),
                    FmtData::GroupExit(data) => named_fmt!(formatter.fmt_group_exit(data)),
                });
            }
            (formatter, fmt_errors)
        });

        let sink = |event: ReportEvent<'p, '_>| {
            let data: FmtData<'p, F> = match event {
                ReportEvent::GroupEnter(scope) => {
                    FmtData::GroupEnter(FmtGroupEnter { scope }.into())
                }
                ReportEvent::Fixture { scope, report } => {
                    FmtData::Fixture(FmtFixture { scope, report }.into())
                }
                ReportEvent::TestStart(unit) => FmtData::TestStart(
                    FmtTestStart {
                        scope: plan.scope(unit.scope),
                        unit,
                    }
                    .into(),
                ),
                ReportEvent::TestOutcome { unit, outcome } => FmtData::TestOutcome(
                    FmtTestOutcome {
                        scope: plan.scope(unit.scope),
                        unit,
                        outcome,
                    }
                    .into(),
                ),
                ReportEvent::GroupExit(scope) => FmtData::GroupExit(FmtGroupExit { scope }.into()),
            };
            // a dead formatter thread must not stop the run
            let _ = ftx.send(data);
        };

        let results = Executor::new(plan, sink, panic_handler).run();

        drop(ftx);
        let (formatter, fmt_errors) = match fmt_thread.join() {
            Ok(joined) => joined,
            Err(payload) => panic::resume_unwind(payload),
        };

        (results, formatter, fmt_errors)
    });
    let results = results?;

    let duration = now.elapsed();
    let outcomes: TestOutcomes<'p> = results
        .outcomes
        .into_iter()
        .map(|(id, outcome)| (plan.unit(id).name.as_str(), outcome))
        .collect();

    fmt_errors.push_on_error(named_fmt!(
        formatter.fmt_run_outcomes(
            FmtRunOutcomes {
                outcomes: &outcomes,
                fixture_failures: &results.fixture_failures,
                filtered_out: plan.filtered_out(),
                duration,
            }
            .into()
        )
    ));

    Ok((outcomes, results.fixture_failures, fmt_errors, duration))
}

impl<'s, Filter, PanicHandler, Formatter> TreeHarness<'s, Filter, PanicHandler, Formatter>
where
    Filter: TestFilter,
{
    /// Print the compiled tree without running anything.
    pub fn list<E>(self) -> Result<Vec<(FormatError, E)>, BuildError>
    where
        Formatter: for<'p> TestListFormatter<'p, Error = E>,
    {
        let plan = self.suite.compile(&self.filter)?;
        Ok(list_plan(&plan, self.formatter))
    }
}

fn list_plan<'p, F: TestListFormatter<'p>>(
    plan: &'p Plan,
    mut formatter: F,
) -> Vec<(FormatError, F::Error)> {
    let mut fmt_errors = Vec::new();
    fmt_errors.push_on_error(named_fmt!(
        formatter.fmt_begin_listing(
            FmtBeginListing {
                tests: plan.len(),
                filtered_out: plan.filtered_out(),
            }
            .into()
        )
    ));

    for event in plan.events() {
        match *event {
            PlanEvent::Enter(id) => fmt_errors.push_on_error(named_fmt!(
                formatter.fmt_list_group(
                    FmtListGroup {
                        scope: plan.scope(id)
                    }
                    .into()
                )
            )),
            PlanEvent::Unit(id) => {
                let unit = plan.unit(id);
                fmt_errors.push_on_error(named_fmt!(
                    formatter.fmt_list_test(
                        FmtListTest {
                            scope: plan.scope(unit.scope),
                            unit,
                        }
                        .into()
                    )
                ))
            }
            PlanEvent::Exit(_) => (),
        }
    }

    fmt_errors.push_on_error(named_fmt!(
        formatter.fmt_end_listing(FmtEndListing { tests: plan.len() }.into())
    ));
    fmt_errors
}

impl<'s, Filter, PanicHandler, Formatter> TreeHarness<'s, Filter, PanicHandler, Formatter> {
    pub fn with_filter<WithFilter: TestFilter>(
        self,
        filter: WithFilter,
    ) -> TreeHarness<'s, WithFilter, PanicHandler, Formatter> {
        TreeHarness {
            suite: self.suite,
            filter,
            panic_handler: self.panic_handler,
            formatter: self.formatter,
        }
    }

    pub fn with_panic_handler<WithPanicHandler: TestPanicHandler>(
        self,
        panic_handler: WithPanicHandler,
    ) -> TreeHarness<'s, Filter, WithPanicHandler, Formatter> {
        TreeHarness {
            suite: self.suite,
            filter: self.filter,
            panic_handler,
            formatter: self.formatter,
        }
    }

    pub fn with_formatter<WithFormatter>(
        self,
        formatter: WithFormatter,
    ) -> TreeHarness<'s, Filter, PanicHandler, WithFormatter> {
        TreeHarness {
            suite: self.suite,
            filter: self.filter,
            panic_handler: self.panic_handler,
            formatter,
        }
    }
}
