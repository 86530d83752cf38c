//! Suite Runner - concurrent test-suite runner
//!
//! Suites are named groups of tests with an optional setup and teardown.
//! The runner executes them on a bounded pool of workers while keeping each
//! suite's console output in one contiguous block.
//!
//! ## Declaring suites
//!
//! ```no_run
//! use suite_runner::{Suite, SuiteRegistry};
//!
//! let mut registry = SuiteRegistry::new();
//! registry
//!     .register(Suite::new("math").test("adds", |ctx| {
//!         ctx.check(1 + 1 == 2);
//!         Ok(())
//!     }))
//!     .unwrap();
//! ```
//!
//! ## Abort rules
//!
//! - a failing `essential` check or `abort_test` ends the current test
//! - `abort_suite` or a panic in a test skips the remaining tests
//! - teardown always runs; a fault there aborts every suite not yet started

pub mod app;
pub mod cli;
pub mod config;
pub mod demos;
pub mod executor;
pub mod models;
pub mod output;
pub mod registry;
pub mod session;
pub mod utils;

pub use executor::{Scheduler, SuiteExecutor, TestContext};
pub use models::{Abort, FailureKind, FailureRecord, Outcome, ResultAggregate, RunReport, Suite};
pub use registry::{RegistryError, SuiteRegistry};
pub use session::SessionLogger;
