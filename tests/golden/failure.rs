use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use grovetest::{context::ContextError, outcome::Verdict, prelude::*};
use pretty_assertions::assert_eq;

use crate::lib::run_pretty;

const VALUE: &str = "test_value";

fn bump(by: i64) -> impl Fn(&mut Context) -> Result<(), ContextError> + Send + Sync + 'static {
    move |ctx| {
        *ctx.require_mut::<i64>(VALUE)? += by;
        Ok(())
    }
}

fn boom(_: &mut Context) -> Result<(), BoxError> {
    Err("boom".into())
}

fn value_is(expected: i64) -> impl Fn(&mut Case<'_>) -> Result<(), BoxError> + Send + Sync + 'static {
    move |case| {
        let value = *case.require::<i64>(VALUE)?;
        case.assert_eq(value, expected)?;
        Ok(())
    }
}

/// Both roots observe one counter, fixtures of the first still run after its
/// tests fail.
fn standard_failures() -> Result<[Group; 2], BuildError> {
    let counter = Arc::new(AtomicI64::new(-1));
    let add = |by: i64| {
        let counter = Arc::clone(&counter);
        move |_: &mut Context| {
            counter.fetch_add(by, Ordering::SeqCst);
        }
    };

    let first = Group::build("Standard Failures", |g| {
        let reset = Arc::clone(&counter);
        g.setup(move |_| reset.store(0, Ordering::SeqCst))?;
        g.test_setup(add(1))?;
        g.test_teardown(add(2))?;
        g.teardown(add(3))?;

        let seen = Arc::clone(&counter);
        g.test_case("fails if test setup ran", move |case| {
            case.assert_eq(seen.load(Ordering::SeqCst), 0)
        })?;
        let seen = Arc::clone(&counter);
        g.test_case("test level fixtures should still run after a failure", move |case| {
            case.assert_eq(seen.load(Ordering::SeqCst), 4)
        })
    })?;

    let second = Group::build("Standard Failures Part 2", |g| {
        let seen = Arc::clone(&counter);
        g.test_case("group level fixtures should still run after a failure", move |case| {
            case.assert_eq(seen.load(Ordering::SeqCst), 9)
        })
    })?;

    Ok([first, second])
}

fn cascading_failure() -> Result<Group, BuildError> {
    Group::build("Cascading Failure", |g| {
        g.setup(|ctx| {
            ctx.set(VALUE, 0_i64);
        })?;
        g.test_setup(bump(1))?;
        g.test_teardown(bump(2))?;
        g.teardown(bump(3))?;
        g.test_case("value is 1", value_is(1))?;

        g.group("Cascading Failure Should Only Affect This Group", |g| {
            g.setup(boom)?;
            g.setup(bump(4))?;
            g.test_setup(bump(5))?;
            g.test_teardown(bump(6))?;
            g.teardown(bump(7))?;
            g.test_case("fails if cacading failure", value_is(15))?;

            g.group("Cascading Failure Should Extend to This Group", |g| {
                g.setup(bump(8))?;
                g.test_setup(bump(9))?;
                g.test_teardown(bump(10))?;
                g.teardown(bump(11))?;
                g.test_case("fails if cacading failure", value_is(45))
            })
        })
    })
}

fn cascading_failure_part_3() -> Result<Group, BuildError> {
    Group::build("Cascading Failure Part 3", |g| {
        g.test("will pass", || ())?;
        g.group("Cascading Failure Should Only Affect This Group", |g| {
            g.setup(boom)?;
            g.test("will fail", || ())
        })?;
        g.group("Cascading Failure Should Not Affect This Group", |g| {
            g.test("will pass", || ())
        })
    })
}

fn fixture_errors() -> Result<[Group; 4], BuildError> {
    // no tests, never shown and never set up
    let setup_error = Group::build("Setup Error", |g| g.setup(boom))?;
    let teardown_error = Group::build("Teardown Error", |g| g.teardown(boom))?;

    let test_setup_error = Group::build("Test Setup Error", |g| {
        g.test_setup(boom)?;
        g.test("will error", || ())
    })?;
    let test_teardown_error = Group::build("Test Teardown Error", |g| {
        g.test_teardown(boom)?;
        g.test("will error", || ())
    })?;

    Ok([setup_error, test_setup_error, teardown_error, test_teardown_error])
}

fn suite() -> Result<Suite, BuildError> {
    let mut suite = Suite::new();
    for group in standard_failures()? {
        suite.add(group);
    }
    suite.add(cascading_failure()?);
    suite.add(cascading_failure_part_3()?);
    for group in fixture_errors()? {
        suite.add(group);
    }
    Ok(suite)
}

const EXPECTED: &str = r#"
running 11 tests
Standard Failures
  fails if test setup ran ... FAIL
  test level fixtures should still run after a failure ... ok
Standard Failures Part 2
  group level fixtures should still run after a failure ... ok
Cascading Failure
  value is 1 ... ok
  Cascading Failure Should Only Affect This Group
    # setup (1/2) ERROR
    fails if cacading failure ... FAIL
    Cascading Failure Should Extend to This Group
      fails if cacading failure ... FAIL
Cascading Failure Part 3
  will pass ... ok
  Cascading Failure Should Only Affect This Group
    # setup (1/1) ERROR
    will fail ... FAIL
  Cascading Failure Should Not Affect This Group
    will pass ... ok
Test Setup Error
  will error ... ERROR
Test Teardown Error
  will error ... ERROR

failures:

---- Standard Failures::fails if test setup ran stdout ----
AssertionError: 1 != 0

---- Cascading Failure::Cascading Failure Should Only Affect This Group::fails if cacading failure stdout ----
note: not run due to a cascading failure
      setup "setup (1/2)" of "Cascading Failure::Cascading Failure Should Only Affect This Group" failed: boom

---- Cascading Failure::Cascading Failure Should Only Affect This Group::Cascading Failure Should Extend to This Group::fails if cacading failure stdout ----
note: not run due to a cascading failure
      setup "setup (1/2)" of "Cascading Failure::Cascading Failure Should Only Affect This Group" failed: boom

---- Cascading Failure Part 3::Cascading Failure Should Only Affect This Group::will fail stdout ----
note: not run due to a cascading failure
      setup "setup (1/1)" of "Cascading Failure Part 3::Cascading Failure Should Only Affect This Group" failed: boom

---- Test Setup Error::will error stdout ----
Error: test setup "test setup (1/1)" of "Test Setup Error" failed: boom

---- Test Teardown Error::will error stdout ----
Error: test teardown "test teardown (1/1)" of "Test Teardown Error" failed: boom


failures:
    Standard Failures::fails if test setup ran
    Cascading Failure::Cascading Failure Should Only Affect This Group::fails if cacading failure
    Cascading Failure::Cascading Failure Should Only Affect This Group::Cascading Failure Should Extend to This Group::fails if cacading failure
    Cascading Failure Part 3::Cascading Failure Should Only Affect This Group::will fail
    Test Setup Error::will error
    Test Teardown Error::will error

fixture failures:
    setup "setup (1/2)" of "Cascading Failure::Cascading Failure Should Only Affect This Group" failed: boom
    setup "setup (1/1)" of "Cascading Failure Part 3::Cascading Failure Should Only Affect This Group" failed: boom

test result: FAILED. 5 passed; 4 failed; 2 errored; 0 filtered out; finished in <duration>

"#;

#[test]
fn standard_and_cascading_failures() {
    let (output, report) = run_pretty(&suite().unwrap()).unwrap();
    assert_eq!(output, EXPECTED);

    let verdict = |name: &str| report.outcome(name).map(|outcome| outcome.verdict());
    assert_eq!(verdict("Cascading Failure::value is 1"), Some(Verdict::Ok));
    assert_eq!(verdict("Test Setup Error::will error"), Some(Verdict::Error));
    assert_eq!(verdict("Setup Error::anything"), None);
    assert!(report.failed());
}

#[test]
fn terse_output_keeps_fixture_errors_visible() {
    let (output, _) = crate::lib::run_terse(&suite().unwrap()).unwrap();
    let head: Vec<_> = output.lines().take(5).collect();
    assert_eq!(
        head,
        [
            "",
            "running 11 tests",
            "F... 4/11",
            "Cascading Failure::Cascading Failure Should Only Affect This Group # setup (1/2) ERROR",
            "FF. 7/11",
        ]
    );
    assert!(output.contains(
        "Cascading Failure Part 3::Cascading Failure Should Only Affect This Group # setup (1/1) ERROR\nF.EE 11/11\n"
    ));
}
