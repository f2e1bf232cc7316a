use std::{
    io,
    sync::{Arc, Mutex},
};

use grovetest::{
    HarnessError, Suite, TestReport,
    formatter::{
        common::color::{ColorSetting, SupportsColor},
        pretty::PrettyFormatter,
        terse::TerseFormatter,
    },
};

mod sanitize;

pub use sanitize::*;

#[derive(Debug, Default, Clone)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("poison error"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("poison error"))?;
        guard.flush()
    }
}

impl SupportsColor for Buffer {
    fn supports_color(&self) -> bool {
        false
    }
}

impl Buffer {
    pub fn to_string_lossy(&self) -> String {
        let guard = self.0.lock().unwrap();
        String::from_utf8_lossy(&guard).into_owned()
    }
}

pub fn run_pretty(suite: &Suite) -> Result<(String, TestReport<io::Error>), HarnessError> {
    let buffer = Buffer::default();
    let report = grovetest::harness(suite)
        .with_formatter(
            PrettyFormatter::default()
                .with_target(buffer.clone())
                .with_color_setting(ColorSetting::Never),
        )
        .run()?;
    Ok((sanitize_duration(&buffer.to_string_lossy()), report))
}

pub fn run_terse(suite: &Suite) -> Result<(String, TestReport<io::Error>), HarnessError> {
    let buffer = Buffer::default();
    let report = grovetest::harness(suite)
        .with_formatter(
            TerseFormatter::default()
                .with_target(buffer.clone())
                .with_color_setting(ColorSetting::Never),
        )
        .run()?;
    Ok((sanitize_duration(&buffer.to_string_lossy()), report))
}

/// The group, fixture and test lines between the `running` header and the
/// blank line in front of the summary.
pub fn stream_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .skip_while(|line| !line.starts_with("running "))
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect()
}
