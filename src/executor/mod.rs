//! Suite execution
//!
//! Runs suites through their lifecycle and schedules them across a bounded
//! pool of workers.

mod context;
mod lifecycle;
mod scheduler;

pub use context::{
    capturing_panics, catch, note_panic_location, panic_message, CaughtPanic, TestContext,
};
pub use lifecycle::{Phase, SuiteExecutor, SuiteOutcome};
pub use scheduler::Scheduler;
