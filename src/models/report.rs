//! Run-level report models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ResultAggregate;

/// Per-suite entry of a run report
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub succeeded: bool,
    pub duration_ms: u64,
    pub results: ResultAggregate,
}

/// Outcome of one scheduler invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Suite requested by name, or `None` for a full run
    pub target: Option<String>,
    pub requested: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub not_found: bool,
    pub run_aborted: bool,
    pub overall: ResultAggregate,
    pub suites: BTreeMap<String, SuiteReport>,
    pub exit_status: u64,
}

impl RunReport {
    pub fn new(
        target: Option<String>,
        requested: usize,
        completed: usize,
        overall: ResultAggregate,
        suites: BTreeMap<String, SuiteReport>,
    ) -> Self {
        let incomplete = requested.saturating_sub(completed);
        let exit_status = incomplete as u64 + overall.penalty();

        Self {
            target,
            requested,
            completed,
            incomplete,
            not_found: false,
            run_aborted: false,
            overall,
            suites,
            exit_status,
        }
    }

    /// Report for a suite name missing from the registry
    pub fn not_found(name: impl Into<String>) -> Self {
        let mut report = Self::new(
            Some(name.into()),
            1,
            0,
            ResultAggregate::new(),
            BTreeMap::new(),
        );
        report.not_found = true;
        report
    }

    pub fn with_run_aborted(mut self, aborted: bool) -> Self {
        self.run_aborted = aborted;
        self
    }

    /// Every requested suite completed without a failure or abort
    pub fn is_clean(&self) -> bool {
        self.incomplete == 0 && self.overall.is_clean()
    }

    /// Suites with at least one failed check, in name order
    pub fn failing_suites(&self) -> impl Iterator<Item = (&String, &SuiteReport)> {
        self.suites
            .iter()
            .filter(|(_, suite)| suite.results.failed_checks > 0)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} suites completed | {} | exit status {}",
            self.completed, self.requested, self.overall, self.exit_status
        )
    }
}
