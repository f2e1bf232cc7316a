use std::io;

use crate::{
    formatter::{
        common::{
            color::{ColorSetting, Paint, SupportsColor, colors::*},
            fto, verdict_color, write_run_outcomes,
        },
        *,
    },
    outcome::Verdict,
};

/// Units per progress line.
const LINE_WIDTH: usize = 88;

/// One character per unit, like libtest's `--format terse`.
///
/// Group headers are not printed. A failing group fixture is printed on a
/// line of its own, prefixed with the group's full name.
#[derive(Debug)]
pub struct TerseFormatter<W: io::Write> {
    target: W,
    color_setting: ColorSetting,
    total: usize,
    progress: usize,
    mid_line: bool,
}

impl Default for TerseFormatter<io::Stdout> {
    fn default() -> Self {
        Self {
            target: io::stdout(),
            color_setting: Default::default(),
            total: 0,
            progress: 0,
            mid_line: false,
        }
    }
}

impl<W: io::Write> TerseFormatter<W> {
    pub fn with_target<WithTarget: io::Write>(
        self,
        with_target: WithTarget,
    ) -> TerseFormatter<WithTarget> {
        TerseFormatter {
            target: with_target,
            color_setting: self.color_setting,
            total: self.total,
            progress: self.progress,
            mid_line: self.mid_line,
        }
    }

    pub fn with_color_setting(self, color_setting: impl Into<ColorSetting>) -> Self {
        TerseFormatter {
            color_setting: color_setting.into(),
            ..self
        }
    }

    pub fn target(&self) -> &W {
        &self.target
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            self.mid_line = false;
            writeln!(self.target, " {}/{}", self.progress, self.total)?;
        }
        Ok(())
    }
}

impl<W: io::Write + SupportsColor> TerseFormatter<W> {
    /// Return whether this formatter will currently emit colored output.
    pub fn use_color(&self) -> bool {
        self.color_setting.use_color(&self.target)
    }
}

#[derive(Debug)]
pub struct TerseFixture<'p> {
    pub group: &'p str,
    pub label: String,
    pub failed: bool,
}

impl<'p, 'o> From<FmtFixture<'p, 'o>> for TerseFixture<'p> {
    fn from(value: FmtFixture<'p, 'o>) -> Self {
        Self {
            group: &value.scope.name,
            label: value.report.label.clone(),
            failed: value.report.failed(),
        }
    }
}

impl<'p, 'o> From<FmtTestOutcome<'p, 'o>> for Verdict {
    fn from(value: FmtTestOutcome<'p, 'o>) -> Self {
        value.outcome.verdict()
    }
}

impl<'p, W: io::Write + Send + SupportsColor> TestFormatter<'p> for TerseFormatter<W> {
    type Error = io::Error;

    type RunStart = fto::TestCount;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        self.total = data.0;
        match data.0 {
            1 => writeln!(self.target, "\nrunning 1 test"),
            count => writeln!(self.target, "\nrunning {count} tests"),
        }
    }

    type Fixture = TerseFixture<'p>;
    fn fmt_fixture(&mut self, data: Self::Fixture) -> Result<(), Self::Error> {
        if !data.failed {
            return Ok(());
        }

        self.end_line()?;
        let error = Paint {
            value: "ERROR",
            color: YELLOW,
            enabled: self.use_color(),
        };
        match data.group.is_empty() {
            true => writeln!(self.target, "# {} {error}", data.label),
            false => writeln!(self.target, "{} # {} {error}", data.group, data.label),
        }
    }

    type TestOutcome = Verdict;
    fn fmt_test_outcome(&mut self, data: Self::TestOutcome) -> Result<(), Self::Error> {
        let symbol = match data {
            Verdict::Ok => ".",
            Verdict::Fail => "F",
            Verdict::Error => "E",
        };
        let symbol = Paint {
            value: symbol,
            color: verdict_color(data),
            enabled: data != Verdict::Ok && self.use_color(),
        };
        write!(self.target, "{symbol}")?;

        self.progress += 1;
        self.mid_line = true;
        if self.progress % LINE_WIDTH == 0 {
            self.end_line()?;
        }
        Ok(())
    }

    type RunOutcomes = fto::RunOutcomes<'p>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        self.end_line()?;
        let use_color = self.use_color();
        write_run_outcomes(&mut self.target, use_color, &data)
    }

    type GroupEnter = ();
    type TestStart = ();
    type GroupExit = ();
}

impl<'p, W: io::Write> TestListFormatter<'p> for TerseFormatter<W> {
    type Error = io::Error;

    type ListTest = fto::UnitName<'p>;
    fn fmt_list_test(&mut self, data: Self::ListTest) -> Result<(), Self::Error> {
        writeln!(self.target, "{}: test", data.0)
    }

    type BeginListing = ();
    type ListGroup = ();
    type EndListing = ();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::Buffer;

    fn formatter() -> TerseFormatter<Buffer> {
        TerseFormatter::default()
            .with_target(Buffer::default())
            .with_color_setting(ColorSetting::Never)
    }

    #[test]
    fn failing_fixtures_break_the_progress_line() {
        let mut fmt = formatter();
        fmt.fmt_run_start(fto::TestCount(3)).unwrap();
        fmt.fmt_test_outcome(Verdict::Ok).unwrap();
        fmt.fmt_fixture(TerseFixture {
            group: "A::B",
            label: "connect".into(),
            failed: false,
        })
        .unwrap();
        fmt.fmt_fixture(TerseFixture {
            group: "A::B",
            label: "setup (1/1)".into(),
            failed: true,
        })
        .unwrap();
        fmt.fmt_test_outcome(Verdict::Fail).unwrap();
        fmt.fmt_test_outcome(Verdict::Error).unwrap();
        fmt.end_line().unwrap();

        assert_eq!(
            fmt.target().contents(),
            "\nrunning 3 tests\n. 1/3\nA::B # setup (1/1) ERROR\nFE 3/3\n"
        );
    }

    #[test]
    fn progress_wraps() {
        let mut fmt = formatter();
        fmt.fmt_run_start(fto::TestCount(LINE_WIDTH + 1)).unwrap();
        for _ in 0..=LINE_WIDTH {
            fmt.fmt_test_outcome(Verdict::Ok).unwrap();
        }

        let contents = fmt.target().contents();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines[2], format!("{} {LINE_WIDTH}/{}", ".".repeat(LINE_WIDTH), LINE_WIDTH + 1));
        assert_eq!(lines[3], ".");
    }
}
