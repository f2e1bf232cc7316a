//! The default formatter, an indented tree of groups, fixtures and tests.
//!
//! ```text
//! running 3 tests
//! Database
//!   # connect
//!   Queries
//!     select ... ok
//!     insert ... FAIL
//!   # teardown (1/1) ERROR
//!   closes ... ok
//! ```

use std::io;

use crate::{
    formatter::{
        common::{
            color::{ColorSetting, Paint, SupportsColor, colors::*},
            fto, indent, paint_verdict, write_run_outcomes,
        },
        *,
    },
    outcome::Verdict,
};

#[derive(Debug)]
pub struct PrettyFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
}

impl Default for PrettyFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
        }
    }
}

impl<W: io::Write> PrettyFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> PrettyFormatter<WithTarget> {
        PrettyFormatter {
            target: with_target,
            color_setting: self.color_setting,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        PrettyFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }

    pub fn target(&self) -> &W {
        &self.target
    }
}

impl<W: io::Write + SupportsColor> PrettyFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }
}

/// A group header, absent for anonymous groups.
#[derive(Debug)]
pub struct GroupLine<'p> {
    pub level: usize,
    pub description: Option<&'p str>,
}

impl<'p> From<FmtGroupEnter<'p>> for GroupLine<'p> {
    fn from(value: FmtGroupEnter<'p>) -> Self {
        Self {
            level: value.scope.level,
            description: value.scope.description(),
        }
    }
}

impl<'p> From<FmtListGroup<'p>> for GroupLine<'p> {
    fn from(value: FmtListGroup<'p>) -> Self {
        Self {
            level: value.scope.level,
            description: value.scope.description(),
        }
    }
}

#[derive(Debug)]
pub struct FixtureLine {
    pub level: usize,
    pub label: String,
    pub failed: bool,

    /// Undescribed fixtures are only shown when they fail.
    pub visible: bool,
}

impl<'p, 'o> From<FmtFixture<'p, 'o>> for FixtureLine {
    fn from(value: FmtFixture<'p, 'o>) -> Self {
        let report = value.report;
        Self {
            level: value.scope.level,
            label: report.label.clone(),
            failed: report.failed(),
            visible: report.described || report.failed(),
        }
    }
}

#[derive(Debug)]
pub struct TestLine<'p> {
    pub level: usize,
    pub description: &'p str,
    pub verdict: Verdict,
}

impl<'p, 'o> From<FmtTestOutcome<'p, 'o>> for TestLine<'p> {
    fn from(value: FmtTestOutcome<'p, 'o>) -> Self {
        Self {
            level: value.scope.level,
            description: value.unit.description(),
            verdict: value.outcome.verdict(),
        }
    }
}

#[derive(Debug)]
pub struct ListedTest<'p> {
    pub level: usize,
    pub description: &'p str,
}

impl<'p> From<FmtListTest<'p>> for ListedTest<'p> {
    fn from(value: FmtListTest<'p>) -> Self {
        Self {
            level: value.scope.level,
            description: value.unit.description(),
        }
    }
}

impl<W: io::Write> PrettyFormatter<W> {
    fn write_group_line(&mut self, data: GroupLine<'_>) -> io::Result<()> {
        match data.description {
            Some(description) => {
                let level = data.level.saturating_sub(1);
                writeln!(self.target, "{}{description}", indent(level))
            }
            None => Ok(()),
        }
    }
}

impl<'p, W: io::Write + Send + SupportsColor> TestFormatter<'p> for PrettyFormatter<W> {
    type Error = io::Error;

    type RunStart = fto::TestCount;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        match data.0 {
            1 => writeln!(self.target, "\nrunning 1 test"),
            count => writeln!(self.target, "\nrunning {count} tests"),
        }
    }

    type GroupEnter = GroupLine<'p>;
    fn fmt_group_enter(&mut self, data: Self::GroupEnter) -> Result<(), Self::Error> {
        self.write_group_line(data)
    }

    type Fixture = FixtureLine;
    fn fmt_fixture(&mut self, data: Self::Fixture) -> Result<(), Self::Error> {
        if !data.visible {
            return Ok(());
        }

        let status = Paint {
            value: if data.failed { "ERROR" } else { "" },
            color: YELLOW,
            enabled: data.failed && self.use_color(),
        };
        writeln!(
            self.target,
            "{}# {} {status}",
            indent(data.level),
            data.label
        )
    }

    type TestOutcome = TestLine<'p>;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let verdict = paint_verdict(data.verdict, self.use_color());
        writeln!(
            self.target,
            "{}{} ... {verdict}",
            indent(data.level),
            data.description
        )
    }

    type RunOutcomes = fto::RunOutcomes<'p>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        let use_color = self.use_color();
        write_run_outcomes(&mut self.target, use_color, &data)
    }

    type TestStart = ();
    type GroupExit = ();
}

impl<'p, W: io::Write> TestListFormatter<'p> for PrettyFormatter<W> {
    type Error = io::Error;

    type ListGroup = GroupLine<'p>;
    fn fmt_list_group(&mut self, data: Self::ListGroup) -> Result<(), Self::Error> {
        self.write_group_line(data)
    }

    type ListTest = ListedTest<'p>;
    fn fmt_list_test(&mut self, data: Self::ListTest) -> Result<(), Self::Error> {
        writeln!(
            self.target,
            "{}{}: test",
            indent(data.level),
            data.description
        )
    }

    type EndListing = fto::TestCount;
    fn fmt_end_listing(&mut self, data: Self::EndListing) -> Result<(), Self::Error> {
        match data.0 {
            1 => writeln!(self.target, "\n1 test"),
            count => writeln!(self.target, "\n{count} tests"),
        }
    }

    type BeginListing = ();
}
