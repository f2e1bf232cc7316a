//! Common helpers for formatter implementations.
//!
//! These are formatter focused and not meant as general purpose building
//! blocks.

use std::io;

use crate::{
    formatter::common::color::{Paint, colors::*},
    outcome::{TestFailure, Verdict},
};

pub mod color;
pub mod fto;

/// Two spaces per level.
pub fn indent(level: usize) -> String {
    "  ".repeat(level)
}

pub(crate) fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Ok => GREEN,
        Verdict::Fail => RED,
        Verdict::Error => YELLOW,
    }
}

pub(crate) fn paint_verdict(verdict: Verdict, enabled: bool) -> Paint<Verdict> {
    Paint {
        value: verdict,
        color: verdict_color(verdict),
        enabled,
    }
}

/// The failure listing and the `test result:` line shared by the run formatters.
pub(crate) fn write_run_outcomes(
    target: &mut impl io::Write,
    use_color: bool,
    outcomes: &fto::RunOutcomes<'_>,
) -> io::Result<()> {
    let fto::RunOutcomes {
        passed,
        failed,
        errored,
        filtered_out,
        duration,
        failures,
        fixture_failures,
    } = outcomes;

    if !failures.is_empty() {
        writeln!(target)?;
        writeln!(target, "failures:")?;
        writeln!(target)?;
        for failure in failures {
            writeln!(target, "---- {} stdout ----", failure.name)?;
            target.write_all(&failure.stdout)?;
            target.write_all(&failure.stderr)?;
            match &failure.failure {
                TestFailure::Assertion(msg) => writeln!(target, "AssertionError: {msg}")?,
                TestFailure::Panicked(msg) => writeln!(target, "panicked: {msg}")?,
                TestFailure::Error(msg) => writeln!(target, "Error: {msg}")?,
                TestFailure::Fixture(fixture) => writeln!(target, "Error: {fixture}")?,
                TestFailure::Cascade(origin) => {
                    writeln!(target, "note: not run due to a cascading failure")?;
                    writeln!(target, "      {origin}")?;
                }
            }
            writeln!(target)?;
        }
        writeln!(target)?;
        writeln!(target, "failures:")?;
        for failure in failures {
            writeln!(target, "    {}", failure.name)?;
        }
    }

    if !fixture_failures.is_empty() {
        writeln!(target)?;
        writeln!(target, "fixture failures:")?;
        for failure in fixture_failures {
            writeln!(target, "    {failure}")?;
        }
    }

    let ok = *failed == 0 && *errored == 0 && fixture_failures.is_empty();
    writeln!(target)?;
    write!(target, "test result: ")?;
    match (ok, use_color) {
        (true, false) => write!(target, "ok. ")?,
        (true, true) => write!(target, "{GREEN}ok{RESET}. ")?,
        (false, false) => write!(target, "FAILED. ")?,
        (false, true) => write!(target, "{RED}FAILED{RESET}. ")?,
    }
    writeln!(
        target,
        "{passed} passed; {failed} failed; {errored} errored; {filtered_out} filtered out; finished in {:.2}s",
        duration.as_secs_f64()
    )?;
    writeln!(target)
}
