//! Suite lifecycle execution
//!
//! Runs one suite through setup, its tests, and teardown, applying the
//! abort escalation rules:
//!
//! - setup: any abort or panic fails the suite and skips every test
//! - tests: `Abort::Test` skips the rest of that test only; `Abort::Suite`
//!   or a panic skips the remaining tests
//! - teardown: always runs; any abort or panic there aborts the whole run

use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use super::context::{catch, CaughtPanic, TestContext};
use crate::models::{Abort, Body, ResultAggregate, Suite};
use crate::session::{Session, SessionLogger};

/// Lifecycle phase of a suite run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SettingUp,
    RunningTests,
    TearingDown,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::SettingUp => "setting up",
            Phase::RunningTests => "running tests",
            Phase::TearingDown => "tearing down",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Result of running one suite
#[derive(Clone, Debug)]
pub struct SuiteOutcome {
    pub name: String,
    pub succeeded: bool,
    pub abort_all: bool,
    pub results: ResultAggregate,
    pub duration_ms: u64,
}

/// How a single body invocation ended
enum BodyExit {
    Completed,
    Aborted(Abort),
    Panicked(CaughtPanic),
}

/// Runs suites one at a time on the calling thread
pub struct SuiteExecutor<'a> {
    logger: &'a SessionLogger,
}

impl<'a> SuiteExecutor<'a> {
    pub fn new(logger: &'a SessionLogger) -> Self {
        Self { logger }
    }

    /// Run `suite` to completion inside its own output session
    pub fn run(&self, suite: &Suite) -> SuiteOutcome {
        let start = Instant::now();
        let session = self.logger.begin();
        let mut run = SuiteRun {
            suite,
            session: &session,
            results: ResultAggregate::new(),
            phase: Phase::Idle,
            suite_failed: false,
            abort_all: false,
        };

        session.line("===========================================================");
        session.line(format!("[blue]Running test suite {}...[/]", suite.name()));

        run.set_up();
        if !run.suite_failed {
            run.run_tests();
        }
        run.tear_down();

        let succeeded = !run.suite_failed && !run.abort_all;
        run.transition(if succeeded { Phase::Done } else { Phase::Failed });

        let outcome = SuiteOutcome {
            name: suite.name().to_string(),
            succeeded,
            abort_all: run.abort_all,
            results: run.results,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        session.end();
        outcome
    }
}

struct SuiteRun<'s, 'l> {
    suite: &'s Suite,
    session: &'s Session<'l>,
    results: ResultAggregate,
    phase: Phase,
    suite_failed: bool,
    abort_all: bool,
}

impl SuiteRun<'_, '_> {
    fn transition(&mut self, next: Phase) {
        debug!(
            suite = self.suite.name(),
            "Phase {} -> {}", self.phase, next
        );
        self.phase = next;
    }

    fn invoke(&mut self, body: &Body) -> BodyExit {
        let mut ctx = TestContext::new(&mut self.results, self.session);
        match catch(|| body(&mut ctx)) {
            Ok(Ok(())) => BodyExit::Completed,
            Ok(Err(abort)) => BodyExit::Aborted(abort),
            Err(panic) => BodyExit::Panicked(panic),
        }
    }

    fn set_up(&mut self) {
        self.transition(Phase::SettingUp);
        let suite = self.suite;
        let Some(setup) = suite.setup_hook() else {
            return;
        };

        self.session.line("Setting up...");
        match self.invoke(setup) {
            BodyExit::Completed => {}
            BodyExit::Aborted(abort) => {
                // A failed setup fails the suite no matter which abort was raised.
                debug!(suite = self.suite.name(), "Setup aborted: {}", abort);
                self.suite_failed = true;
                if abort == Abort::All {
                    self.abort_all = true;
                }
            }
            BodyExit::Panicked(panic) => {
                debug!(suite = self.suite.name(), "Setup panicked: {}", panic);
                self.session.line(format!(
                    "[red]Unhandled panic during setup for '{}' suite: {}[/]",
                    self.suite.name(),
                    panic
                ));
                self.suite_failed = true;
            }
        }
    }

    fn run_tests(&mut self) {
        self.transition(Phase::RunningTests);

        let suite = self.suite;
        for test in suite.tests() {
            self.session.line(format!("Testing {}...", test.name));

            match self.invoke(&test.body) {
                BodyExit::Completed => {}
                BodyExit::Aborted(Abort::Test) => {
                    debug!(suite = self.suite.name(), test = %test.name, "Test aborted");
                    self.results.aborted_tests += 1;
                }
                BodyExit::Aborted(abort) => {
                    debug!(suite = self.suite.name(), test = %test.name, "Suite aborted: {}", abort);
                    self.results.aborted_suites += 1;
                    self.suite_failed = true;
                    if abort == Abort::All {
                        self.abort_all = true;
                    }
                    break;
                }
                BodyExit::Panicked(panic) => {
                    debug!(suite = self.suite.name(), test = %test.name, "Test panicked: {}", panic);
                    self.session.line(format!(
                        "[red]Unhandled panic during '{}' test. Aborting suite: {}[/]",
                        test.name, panic
                    ));
                    self.results.aborted_suites += 1;
                    self.suite_failed = true;
                    break;
                }
            }
        }
    }

    fn tear_down(&mut self) {
        self.transition(Phase::TearingDown);

        let suite = self.suite;
        let exit = match suite.teardown_hook() {
            Some(teardown) => {
                self.session.line("Tearing down...");
                self.invoke(teardown)
            }
            None => BodyExit::Completed,
        };

        match exit {
            BodyExit::Completed => {
                if self.results.failed_checks == 0 {
                    self.session.line(format!(
                        "[green]All {} checks passed![/]",
                        self.results.total_checks
                    ));
                } else {
                    self.session.line(format!(
                        "[red]{} of {} checks failed![/]",
                        self.results.failed_checks, self.results.total_checks
                    ));
                }
            }
            BodyExit::Aborted(_) | BodyExit::Panicked(_) => {
                warn!(suite = self.suite.name(), "Teardown failed, aborting run");
                self.session.line(format!(
                    "[red]Unhandled fault during teardown for '{}' suite. Aborting ALL suites.[/]",
                    self.suite.name()
                ));
                self.abort_all = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySink;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
    use std::sync::Arc;

    fn run(suite: &Suite) -> (SuiteOutcome, Vec<String>) {
        let sink = MemorySink::new();
        let logger = SessionLogger::new(sink.clone()).with_color(false);
        let outcome = SuiteExecutor::new(&logger).run(suite);
        (outcome, sink.lines())
    }

    #[test]
    fn test_setup_test_teardown_all_pass() {
        let value = Arc::new(AtomicI32::new(0));
        let (v1, v2, v3) = (value.clone(), value.clone(), value.clone());

        let suite = Suite::new("setup/teardown")
            .setup(move |ctx| {
                v1.store(10, Ordering::SeqCst);
                ctx.essential(v1.load(Ordering::SeqCst) == 10)
            })
            .test("reads value", move |ctx| {
                ctx.check(v2.load(Ordering::SeqCst) == 10);
                Ok(())
            })
            .teardown(move |ctx| {
                ctx.essential(v3.load(Ordering::SeqCst) == 10)?;
                v3.store(0, Ordering::SeqCst);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(outcome.succeeded);
        assert!(!outcome.abort_all);
        assert_eq!(outcome.results.counters(), (3, 0, 0, 0));
        assert_eq!(value.load(Ordering::SeqCst), 0);
        assert_eq!(
            lines,
            vec![
                "===========================================================",
                "Running test suite setup/teardown...",
                "Setting up...",
                "Testing reads value...",
                "Tearing down...",
                "All 3 checks passed!",
            ]
        );
    }

    #[test]
    fn test_failing_check_does_not_fail_suite() {
        let suite = Suite::new("checks").test("false", |ctx| {
            ctx.check(false);
            Ok(())
        });

        let (outcome, lines) = run(&suite);
        assert!(outcome.succeeded);
        assert_eq!(outcome.results.counters(), (1, 1, 0, 0));
        assert_eq!(lines.last().map(String::as_str), Some("1 of 1 checks failed!"));
    }

    #[test]
    fn test_essential_failure_aborts_only_that_test() {
        let suite = Suite::new("essential")
            .test("first", |ctx| {
                ctx.essential(false)?;
                ctx.check(true);
                Ok(())
            })
            .test("second", |ctx| {
                ctx.check(true);
                Ok(())
            });

        let (outcome, _) = run(&suite);
        assert!(outcome.succeeded);
        assert_eq!(outcome.results.counters(), (2, 1, 1, 0));
    }

    #[test]
    fn test_suite_abort_skips_remaining_tests_but_runs_teardown() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();

        let suite = Suite::new("abort")
            .test("aborts", |ctx| Err(ctx.abort_suite("no database")))
            .test("skipped", |ctx| {
                ctx.check(true);
                Ok(())
            })
            .teardown(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(!outcome.abort_all);
        assert_eq!(outcome.results.counters(), (0, 0, 0, 1));
        assert!(torn_down.load(Ordering::SeqCst));
        assert!(!lines.iter().any(|l| l == "Testing skipped..."));
    }

    #[test]
    fn test_setup_failure_skips_tests_and_still_tears_down() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();

        let suite = Suite::new("broken setup")
            .setup(|ctx| ctx.essential(false))
            .test("never runs", |ctx| {
                ctx.check(true);
                Ok(())
            })
            .teardown(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(!outcome.abort_all);
        assert_eq!(outcome.results.counters(), (1, 1, 0, 0));
        assert!(torn_down.load(Ordering::SeqCst));
        assert!(!lines.iter().any(|l| l.starts_with("Testing")));
    }

    #[test]
    fn test_panic_in_test_aborts_suite() {
        let suite = Suite::new("panics")
            .test("explodes", |_| panic!("kaboom"))
            .test("skipped", |ctx| {
                ctx.check(true);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.results.counters(), (0, 0, 0, 1));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("Unhandled panic during 'explodes' test. Aborting suite: kaboom")));
        assert!(!lines.iter().any(|l| l == "Testing skipped..."));
    }

    #[test]
    fn test_teardown_fault_escalates_to_abort_all() {
        let suite = Suite::new("bad teardown")
            .test("fine", |ctx| {
                ctx.check(true);
                Ok(())
            })
            .teardown(|ctx| ctx.essential(false));

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(outcome.abort_all);
        assert_eq!(outcome.results.counters(), (2, 1, 0, 0));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Unhandled fault during teardown for 'bad teardown' suite. Aborting ALL suites.")
        );
    }

    #[test]
    fn test_panic_in_test_reports_location() {
        crate::utils::install_panic_hook();

        let line = line!() + 1;
        let suite = Suite::new("located").test("explodes", |_| panic!("kaboom"));

        let (outcome, lines) = run(&suite);
        assert_eq!(outcome.results.aborted_suites, 1);
        let expected = format!(
            "Unhandled panic during 'explodes' test. Aborting suite: kaboom in {} on line {}",
            file!(),
            line
        );
        assert!(lines.contains(&expected), "{lines:?}");
    }

    #[test]
    fn test_setup_panic_skips_tests_and_still_tears_down() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();

        let suite = Suite::new("panicking setup")
            .setup(|_| panic!("no fixture"))
            .test("never runs", |ctx| {
                ctx.check(true);
                Ok(())
            })
            .teardown(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(!outcome.abort_all);
        assert_eq!(outcome.results.counters(), (0, 0, 0, 0));
        assert!(torn_down.load(Ordering::SeqCst));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("Unhandled panic during setup for 'panicking setup' suite: no fixture")));
        assert!(!lines.iter().any(|l| l.starts_with("Testing")));
        assert_eq!(lines.last().map(String::as_str), Some("All 0 checks passed!"));
    }

    #[test]
    fn test_explicit_abort_test_keeps_later_tests() {
        let suite = Suite::new("abort test")
            .test("gives up", |ctx| {
                ctx.check(true);
                Err(ctx.abort_test())
            })
            .test("still runs", |ctx| {
                ctx.check(true);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(outcome.succeeded);
        assert_eq!(outcome.results.counters(), (2, 0, 1, 0));
        assert_eq!(outcome.results.failures.len(), 1);
        assert_eq!(outcome.results.failures[0].kind, crate::models::FailureKind::AbortTest);
        assert!(lines.iter().any(|l| l == "Testing still runs..."));
    }

    #[test]
    fn test_abort_all_from_test_skips_rest_and_escalates() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();

        let suite = Suite::new("stop everything")
            .test("halts", |_| Err(Abort::All))
            .test("skipped", |ctx| {
                ctx.check(true);
                Ok(())
            })
            .teardown(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });

        let (outcome, lines) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(outcome.abort_all);
        assert_eq!(outcome.results.counters(), (0, 0, 0, 1));
        assert!(torn_down.load(Ordering::SeqCst));
        assert!(!lines.iter().any(|l| l == "Testing skipped..."));
    }

    #[test]
    fn test_abort_all_from_setup_escalates() {
        let suite = Suite::new("setup halts")
            .setup(|_| Err(Abort::All))
            .test("never runs", |ctx| {
                ctx.check(true);
                Ok(())
            });

        let (outcome, _) = run(&suite);
        assert!(!outcome.succeeded);
        assert!(outcome.abort_all);
        assert_eq!(outcome.results.counters(), (0, 0, 0, 0));
    }

    #[test]
    fn test_teardown_panic_escalates_to_abort_all() {
        let suite = Suite::new("panicking teardown").teardown(|_| panic!("unwind failed"));

        let (outcome, _) = run(&suite);
        assert!(outcome.abort_all);
    }
}
