//! Group fixtures are only printed when they carry a description or fail.

use grovetest::prelude::*;
use pretty_assertions::assert_eq;

use crate::lib::{run_pretty, stream_lines};

fn pass(_: &mut Context) {}

fn boom(_: &mut Context) -> Result<(), BoxError> {
    Err("boom".into())
}

const SETUP: &str = "setup w/ description";
const TEARDOWN: &str = "teardown w/ description";

fn undescribed() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup(pass)?;
        g.teardown(pass)?;
        g.group("B", |g| {
            g.setup(pass)?;
            g.test("some test", || ())?;
            g.teardown(pass)
        })
    })
}

fn described() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown_described(TEARDOWN, pass)?;
        g.group("B", |g| {
            g.setup_described(SETUP, pass)?;
            g.test("some test", || ())?;
            g.teardown_described(TEARDOWN, pass)
        })
    })
}

fn failing_described_setup() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, boom)?;
        g.teardown_described(TEARDOWN, pass)?;
        g.group("B", |g| {
            g.setup_described(SETUP, pass)?;
            g.test("some test", || ())?;
            g.teardown_described(TEARDOWN, pass)
        })
    })
}

fn failing_undescribed_setup() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup(boom)?;
        g.teardown_described(TEARDOWN, pass)?;
        g.group("B", |g| {
            g.setup_described(SETUP, pass)?;
            g.test("some test", || ())?;
            g.teardown_described(TEARDOWN, pass)
        })
    })
}

/// `B` with a failing undescribed teardown in front of a described one.
fn b_with_failing_teardown(g: &mut GroupBuilder) -> Result<(), BuildError> {
    g.group("B", |g| {
        g.setup_described(SETUP, pass)?;
        g.test("some test", || ())?;
        g.teardown(boom)?;
        g.teardown_described(TEARDOWN, pass)
    })
}

fn failing_nested_teardown() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown_described(TEARDOWN, pass)?;
        b_with_failing_teardown(g)
    })
}

fn failing_nested_teardown_without_outer_teardown() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        b_with_failing_teardown(g)
    })
}

fn failing_nested_teardown_with_undescribed_outer_teardown() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown(pass)?;
        b_with_failing_teardown(g)
    })
}

fn failing_teardowns_on_both_levels() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown(boom)?;
        g.teardown_described(TEARDOWN, pass)?;
        b_with_failing_teardown(g)
    })
}

fn failing_middle_teardown() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown_described(TEARDOWN, pass)?;
        g.group("B", |g| {
            g.setup_described(SETUP, pass)?;
            g.test("some test", || ())?;
            g.teardown_described(TEARDOWN, pass)?;
            g.teardown(boom)?;
            g.teardown_described(TEARDOWN, pass)
        })
    })
}

fn failing_described_teardown() -> Result<Group, BuildError> {
    Group::build("A", |g| {
        g.setup_described(SETUP, pass)?;
        g.teardown_described(TEARDOWN, pass)?;
        g.group("B", |g| {
            g.setup_described(SETUP, pass)?;
            g.test("some test", || ())?;
            g.teardown_described(TEARDOWN, boom)?;
            g.teardown_described(TEARDOWN, pass)
        })
    })
}

fn suite() -> Result<Suite, BuildError> {
    Ok(Suite::new()
        .with(undescribed()?)
        .with(described()?)
        .with(failing_described_setup()?)
        .with(failing_undescribed_setup()?)
        .with(failing_nested_teardown()?)
        .with(failing_nested_teardown_without_outer_teardown()?)
        .with(failing_nested_teardown_with_undescribed_outer_teardown()?)
        .with(failing_teardowns_on_both_levels()?)
        .with(failing_middle_teardown()?)
        .with(failing_described_teardown()?)
        .with(undescribed()?))
}

const EXPECTED_STREAM: &[&str] = &[
    "A",
    "  B",
    "    some test ... ok",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown w/ description ",
    "  # teardown w/ description ",
    "A",
    "  # setup w/ description ERROR",
    "  B",
    "    some test ... FAIL",
    "  # teardown w/ description ",
    "A",
    "  # setup (1/1) ERROR",
    "  B",
    "    some test ... FAIL",
    "  # teardown w/ description ",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown (1/2) ERROR",
    "  # teardown w/ description ",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown (1/2) ERROR",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown (1/2) ERROR",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown (1/2) ERROR",
    "  # teardown (1/2) ERROR",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown w/ description ",
    "    # teardown (2/3) ERROR",
    "  # teardown w/ description ",
    "A",
    "  # setup w/ description ",
    "  B",
    "    # setup w/ description ",
    "    some test ... ok",
    "    # teardown w/ description ERROR",
    "  # teardown w/ description ",
    "A",
    "  B",
    "    some test ... ok",
];

#[test]
fn fixture_lines() {
    let (output, report) = run_pretty(&suite().unwrap()).unwrap();

    assert_eq!(stream_lines(&output), EXPECTED_STREAM);
    assert!(output.starts_with("\nrunning 11 tests\n"));
    assert!(output.ends_with(
        "test result: FAILED. 9 passed; 2 failed; 0 errored; 0 filtered out; finished in <duration>\n\n"
    ));

    // two setups and seven teardowns
    assert_eq!(report.fixture_failures.len(), 9);
    assert!(report.failed());
}
