//! Assertion primitives available to setup, test, and teardown bodies
//!
//! Every primitive records the caller's source location, so failures point
//! at the assertion inside the body rather than at this module.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};

use crate::models::{Abort, FailureKind, FailureRecord, Outcome, ResultAggregate};
use crate::session::Session;

/// Handle passed to every body: the suite's aggregate plus its output session
pub struct TestContext<'a> {
    results: &'a mut ResultAggregate,
    session: &'a Session<'a>,
}

impl<'a> TestContext<'a> {
    pub fn new(results: &'a mut ResultAggregate, session: &'a Session<'a>) -> Self {
        Self { results, session }
    }

    /// Count a check. Failure is recorded but never aborts.
    #[track_caller]
    pub fn check(&mut self, condition: bool) -> bool {
        self.count(condition, FailureKind::Check, Location::caller());
        condition
    }

    /// Count a check whose failure aborts the current test.
    ///
    /// ```ignore
    /// ctx.essential(conn.is_open())?;
    /// ```
    #[track_caller]
    pub fn essential(&mut self, condition: bool) -> Outcome {
        self.count(condition, FailureKind::Essential, Location::caller());
        if condition {
            Ok(())
        } else {
            Err(Abort::Test)
        }
    }

    /// Record an explicit test abort. Return the result from the body.
    #[track_caller]
    pub fn abort_test(&mut self) -> Abort {
        self.fail(FailureRecord::new(FailureKind::AbortTest, Location::caller()));
        Abort::Test
    }

    /// Record an explicit suite abort with a message. Return the result from the body.
    #[track_caller]
    pub fn abort_suite(&mut self, message: impl Into<String>) -> Abort {
        let record =
            FailureRecord::new(FailureKind::AbortSuite, Location::caller()).with_detail(message);
        self.fail(record);
        Abort::Suite
    }

    /// Passes if `f` panics
    #[track_caller]
    pub fn expect_panic<T>(&mut self, f: impl FnOnce() -> T) -> bool {
        let panicked = catch(f).is_err();
        self.check(panicked)
    }

    /// Passes if `f` returns an error of kind `K`. A panic, `Ok`, or any
    /// other error kind fails.
    #[track_caller]
    pub fn expect_error<K, T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> bool
    where
        K: fmt::Display + fmt::Debug + Send + Sync + 'static,
        E: Into<anyhow::Error>,
    {
        let matched = match catch(f) {
            Ok(Err(e)) => {
                let error: anyhow::Error = e.into();
                error.downcast_ref::<K>().is_some()
            }
            Ok(Ok(_)) | Err(_) => false,
        };
        self.check(matched)
    }

    /// Passes if `f` returns without panicking
    #[track_caller]
    pub fn expect_no_panic<T>(&mut self, f: impl FnOnce() -> T) -> bool {
        let completed = catch(f).is_ok();
        self.check(completed)
    }

    /// Passes if `f` returns `Ok` without panicking
    #[track_caller]
    pub fn expect_ok<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> bool {
        let ok = matches!(catch(f), Ok(Ok(_)));
        self.check(ok)
    }

    /// Write a line of output for this suite
    pub fn log(&self, line: impl AsRef<str>) {
        self.session.line(line);
    }

    /// Totals recorded so far in this suite
    pub fn results(&self) -> &ResultAggregate {
        self.results
    }

    fn count(&mut self, passed: bool, kind: FailureKind, location: &Location<'_>) {
        let failure = (!passed).then(|| FailureRecord::new(kind, location));
        if let Some(record) = &failure {
            self.session.line(format!("[red]{record}[/]"));
        }
        self.results.record_check(failure);
    }

    fn fail(&mut self, record: FailureRecord) {
        self.session.line(format!("[red]{record}[/]"));
        self.results.record_failure(record);
    }
}

thread_local! {
    static CAPTURE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PANIC_LOCATION: RefCell<Option<(String, u32)>> = const { RefCell::new(None) };
}

/// A panic caught while running suite code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaughtPanic {
    pub message: String,
    /// Where the panic was raised, when the panic hook saw it
    pub location: Option<(String, u32)>,
}

impl fmt::Display for CaughtPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some((file, line)) => write!(f, "{} in {} on line {}", self.message, file, line),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Run suite code, turning a panic into a `CaughtPanic`
pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R, CaughtPanic> {
    PANIC_LOCATION.with(|location| location.borrow_mut().take());
    CAPTURE_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURE_DEPTH.with(|depth| depth.set(depth.get() - 1));

    result.map_err(|payload| CaughtPanic {
        message: panic_message(payload.as_ref()),
        location: PANIC_LOCATION.with(|location| location.borrow_mut().take()),
    })
}

/// Whether a panic on this thread would be caught by `catch`
pub fn capturing_panics() -> bool {
    CAPTURE_DEPTH.with(Cell::get) > 0
}

/// Remember where a captured panic was raised. Called from the panic hook.
pub fn note_panic_location(file: &str, line: u32) {
    PANIC_LOCATION.with(|location| *location.borrow_mut() = Some((file.to_string(), line)));
}

/// Readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
