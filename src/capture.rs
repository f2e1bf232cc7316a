//! Output capture for fixtures and tests.
//!
//! Code running inside the executor can use this crate's [`print!`],
//! [`println!`], [`eprint!`], [`eprintln!`] and [`dbg!`] macros instead of
//! the std ones. They write into a thread-local buffer that the executor
//! drains into each unit's [`TestOutcome`](crate::outcome::TestOutcome), so
//! output only shows up in the failure listing of the unit that produced it.

use std::{
    cell::RefCell,
    io::Write,
    mem,
    panic::{self, PanicHookInfo},
};

#[derive(Debug, Default)]
pub struct TestOutputCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl TestOutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }

    pub fn take(&mut self) -> Self {
        let stdout = mem::take(&mut self.stdout);
        let stderr = mem::take(&mut self.stderr);
        Self { stdout, stderr }
    }
}

pub(crate) fn take_output() -> TestOutputCapture {
    TEST_OUTPUT_CAPTURE.with_borrow_mut(TestOutputCapture::take)
}

pub(crate) fn clear_output() {
    TEST_OUTPUT_CAPTURE.with_borrow_mut(TestOutputCapture::clear);
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Routes panic messages into the capture buffer while alive.
///
/// The previous hook is restored on drop.
pub struct CapturePanicHookGuard(Option<PanicHook>);

impl CapturePanicHookGuard {
    pub fn install() -> Self {
        let old_hook = panic::take_hook();

        panic::set_hook(Box::new(|info| {
            let payload = info.payload();
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
            let Some(message) = message else { return };

            TEST_OUTPUT_CAPTURE.with_borrow_mut(|capture| {
                match info.location() {
                    Some(location) => writeln!(capture.stderr, "panicked at {location}:\n{message}"),
                    None => writeln!(capture.stderr, "{message}"),
                }
                .expect("infallible for Vec<u8>")
            });
        }));

        Self(Some(old_hook))
    }
}

impl Drop for CapturePanicHookGuard {
    fn drop(&mut self) {
        if let Some(old_hook) = self.0.take() {
            panic::set_hook(old_hook);
        }
    }
}

thread_local! {
    pub static TEST_OUTPUT_CAPTURE: RefCell<TestOutputCapture> = RefCell::new(TestOutputCapture::new());
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        use ::std::io::Write;
        $crate::capture::TEST_OUTPUT_CAPTURE.with_borrow_mut(|capture| {
            capture.stdout.write_fmt(::std::format_args!($($arg)*)).expect("infallible for Vec<u8>");
        });
    }};
}

#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => {{
        use ::std::io::Write;
        $crate::capture::TEST_OUTPUT_CAPTURE.with_borrow_mut(|capture| {
            capture.stdout.write_fmt(::std::format_args!($($arg)*)).expect("infallible for Vec<u8>");
            capture.stdout.push(b'\n');
        });
    }};
}

#[macro_export]
macro_rules! eprint {
    ($($arg:tt)*) => {{
        use ::std::io::Write;
        $crate::capture::TEST_OUTPUT_CAPTURE.with_borrow_mut(|capture| {
            capture.stderr.write_fmt(::std::format_args!($($arg)*)).expect("infallible for Vec<u8>");
        });
    }};
}

#[macro_export]
macro_rules! eprintln {
    ($($arg:tt)*) => {{
        use ::std::io::Write;
        $crate::capture::TEST_OUTPUT_CAPTURE.with_borrow_mut(|capture| {
            capture.stderr.write_fmt(::std::format_args!($($arg)*)).expect("infallible for Vec<u8>");
            capture.stderr.push(b'\n');
        });
    }};
}

#[macro_export]
macro_rules! dbg {
    () => {
        $crate::eprintln!("[{}:{}:{}]", ::std::file!(), ::std::line!(), ::std::column!())
    };
    ($val:expr $(,)?) => {
        match $val {
            tmp => {
                $crate::eprintln!(
                    "[{}:{}:{}] {} = {:#?}",
                    ::std::file!(),
                    ::std::line!(),
                    ::std::column!(),
                    ::std::stringify!($val),
                    &&tmp as &dyn ::std::fmt::Debug,
                );
                tmp
            }
        }
    };
    ($($val:expr),+ $(,)?) => {
        ($($crate::dbg!($val)),+,)
    };
}
