//! Data models for suite execution
//!
//! This module contains the suite definitions, abort signals, result
//! aggregates, and run reports.

mod report;
mod results;
mod suite;

pub use report::{RunReport, SuiteReport};
pub use results::{FailureKind, FailureRecord, ResultAggregate};
pub use suite::{Abort, Body, Outcome, Suite, TestEntry};
