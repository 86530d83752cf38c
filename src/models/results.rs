//! Check results and failure records
//!
//! Defines the per-suite result aggregate and its merge operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::panic::Location;

/// Which assertion produced a failure record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Check,
    Essential,
    AbortTest,
    AbortSuite,
}

impl FailureKind {
    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Check => "check",
            FailureKind::Essential => "essential check",
            FailureKind::AbortTest => "abort test",
            FailureKind::AbortSuite => "abort suite",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single recorded failure with its source location
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub file: String,
    pub line: u32,
    pub detail: Option<String>,
}

impl FailureRecord {
    pub fn new(kind: FailureKind, location: &Location<'_>) -> Self {
        Self {
            kind,
            file: location.file().to_string(),
            line: location.line(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Check => {
                write!(f, "Failed check in {} on line {}!", self.file, self.line)
            }
            FailureKind::Essential => write!(
                f,
                "Failed essential check in {} on line {}! Aborting test.",
                self.file, self.line
            ),
            FailureKind::AbortTest => {
                write!(f, "Abort Test called in {} on line {}!", self.file, self.line)
            }
            FailureKind::AbortSuite => {
                write!(f, "Abort Suite called in {} on line {}", self.file, self.line)?;
                match &self.detail {
                    Some(detail) => write!(f, ": {detail}"),
                    None => write!(f, "!"),
                }
            }
        }
    }
}

/// Cumulative check, failure and abort totals for a suite or a whole run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultAggregate {
    pub total_checks: u32,
    pub failed_checks: u32,
    pub aborted_tests: u32,
    pub aborted_suites: u32,
    pub failures: Vec<FailureRecord>,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one check. A failed check carries its record.
    pub fn record_check(&mut self, failure: Option<FailureRecord>) {
        self.total_checks += 1;
        if let Some(record) = failure {
            self.failed_checks += 1;
            self.failures.push(record);
        }
    }

    /// Append a failure record without touching the counters
    pub fn record_failure(&mut self, record: FailureRecord) {
        self.failures.push(record);
    }

    /// Fold `other` into `self`. Counters add, records append after ours.
    pub fn merge(&mut self, other: ResultAggregate) {
        self.total_checks += other.total_checks;
        self.failed_checks += other.failed_checks;
        self.aborted_tests += other.aborted_tests;
        self.aborted_suites += other.aborted_suites;
        self.failures.extend(other.failures);
    }

    /// The four counters, for comparisons that ignore record order
    pub fn counters(&self) -> (u32, u32, u32, u32) {
        (
            self.total_checks,
            self.failed_checks,
            self.aborted_tests,
            self.aborted_suites,
        )
    }

    /// Contribution of this aggregate to a process exit status
    pub fn penalty(&self) -> u64 {
        u64::from(self.failed_checks) + u64::from(self.aborted_tests) + u64::from(self.aborted_suites)
    }

    pub fn is_clean(&self) -> bool {
        self.failed_checks == 0 && self.aborted_tests == 0 && self.aborted_suites == 0
    }
}

impl Add for ResultAggregate {
    type Output = ResultAggregate;

    fn add(mut self, rhs: ResultAggregate) -> ResultAggregate {
        self.merge(rhs);
        self
    }
}

impl AddAssign for ResultAggregate {
    fn add_assign(&mut self, rhs: ResultAggregate) {
        self.merge(rhs);
    }
}

impl fmt::Display for ResultAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Checks: {} | Failed: {} | Aborted tests: {} | Aborted suites: {}",
            self.total_checks, self.failed_checks, self.aborted_tests, self.aborted_suites
        )
    }
}
