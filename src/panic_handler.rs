//! Panic handling for fixtures and tests.
//!
//! The executor hands every user callable to a [`TestPanicHandler`]. The
//! default handler catches unwinding panics so a panicking test only fails
//! itself, [`NoPanicHandler`] lets panics propagate and abort the run.

use std::{
    any::Any,
    panic::{UnwindSafe, catch_unwind},
};

use crate::test::TestResult;

/// What came out of a handled call.
#[derive(Debug)]
pub enum Handled {
    Returned(TestResult),
    Panicked(String),
}

pub trait TestPanicHandler {
    fn handle<F: FnOnce() -> TestResult + UnwindSafe>(&self, f: F) -> Handled;
}

#[derive(Debug, Default)]
pub struct NoPanicHandler;

impl TestPanicHandler for NoPanicHandler {
    fn handle<F: FnOnce() -> TestResult + UnwindSafe>(&self, f: F) -> Handled {
        Handled::Returned(f())
    }
}

#[derive(Debug, Default)]
pub struct DefaultPanicHandler;

impl DefaultPanicHandler {
    pub fn downcast_panic_err(err: Box<dyn Any + Send + 'static>) -> String {
        err.downcast::<&'static str>()
            .map(|s| s.to_string())
            .or_else(|err| err.downcast::<String>().map(|s| *s))
            .unwrap_or_else(|_| String::from("non-string panic payload"))
    }
}

impl TestPanicHandler for DefaultPanicHandler {
    fn handle<F: FnOnce() -> TestResult + UnwindSafe>(&self, f: F) -> Handled {
        match catch_unwind(f) {
            Ok(result) => Handled::Returned(result),
            Err(err) => Handled::Panicked(Self::downcast_panic_err(err)),
        }
    }
}
