//! Concurrent suite scheduling
//!
//! Dispatches suites onto a bounded pool of blocking workers and folds their
//! results into a run report.

use anyhow::{Context, Result};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::lifecycle::{SuiteExecutor, SuiteOutcome};
use crate::config::default_worker_count;
use crate::models::{ResultAggregate, RunReport, Suite, SuiteReport};
use crate::output::{not_found_line, summary_lines};
use crate::registry::SuiteRegistry;
use crate::session::SessionLogger;

/// Shared state written by finished workers
#[derive(Default)]
struct RunState {
    suites: Mutex<BTreeMap<String, SuiteReport>>,
    overall: Mutex<ResultAggregate>,
    completed: AtomicUsize,
    abort_requested: AtomicBool,
}

impl RunState {
    fn record(&self, outcome: SuiteOutcome) {
        if outcome.succeeded {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        // Set before the worker releases its permit so the dispatcher sees it.
        if outcome.abort_all {
            self.abort_requested.store(true, Ordering::SeqCst);
        }

        self.overall.lock().merge(outcome.results.clone());
        self.suites.lock().insert(
            outcome.name,
            SuiteReport {
                succeeded: outcome.succeeded,
                duration_ms: outcome.duration_ms,
                results: outcome.results,
            },
        );
    }

    fn abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    fn into_report(self, target: Option<String>, requested: usize) -> RunReport {
        let run_aborted = self.abort_requested.into_inner();
        RunReport::new(
            target,
            requested,
            self.completed.into_inner(),
            self.overall.into_inner(),
            self.suites.into_inner(),
        )
        .with_run_aborted(run_aborted)
    }
}

/// Runs registered suites with bounded concurrency
pub struct Scheduler {
    registry: Arc<SuiteRegistry>,
    logger: Arc<SessionLogger>,
    max_workers: usize,
}

impl Scheduler {
    pub fn new(registry: Arc<SuiteRegistry>, logger: Arc<SessionLogger>) -> Self {
        Self {
            registry,
            logger,
            max_workers: default_worker_count(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run one named suite, or every suite when `suite` is `None`, then print
    /// the summary.
    pub async fn run(&self, suite: Option<&str>) -> Result<RunReport> {
        let start = Instant::now();

        let report = match suite {
            Some(name) => self.run_named(name).await?,
            None => self.run_all().await?,
        };

        self.logger.flush();
        for line in summary_lines(&report) {
            self.logger.println(line);
        }

        info!(
            "Run finished in {}ms - {}",
            start.elapsed().as_millis(),
            report
        );
        Ok(report)
    }

    /// Run each named suite in turn. Reports come back in the given order.
    pub async fn run_each(&self, names: &[String]) -> Result<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            reports.push(self.run(Some(name)).await?);
        }
        Ok(reports)
    }

    async fn run_named(&self, name: &str) -> Result<RunReport> {
        let Some(suite) = self.registry.get(name) else {
            warn!("Suite '{}' is not registered", name);
            self.logger.println(not_found_line(name));
            return Ok(RunReport::not_found(name));
        };

        info!("Running suite '{}'", name);
        let state = RunState::default();
        let outcome = self.execute(Arc::clone(suite)).await?;
        state.record(outcome);

        Ok(state.into_report(Some(name.to_string()), 1))
    }

    async fn run_all(&self) -> Result<RunReport> {
        let requested = self.registry.len();
        info!(
            "Running {} suites (max {} concurrent)",
            requested, self.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let state = Arc::new(RunState::default());
        let mut handles = Vec::with_capacity(requested);

        for (dispatched, suite) in self.registry.iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .context("Worker pool closed")?;

            if state.abort_requested() {
                warn!(
                    "Run aborted, {} suites not dispatched",
                    requested - dispatched
                );
                break;
            }

            debug!("Dispatching suite '{}'", suite.name());
            let suite = Arc::clone(suite);
            let logger = Arc::clone(&self.logger);
            let state = Arc::clone(&state);

            handles.push(tokio::task::spawn_blocking(move || {
                let outcome = SuiteExecutor::new(&logger).run(&suite);
                state.record(outcome);
                drop(permit);
            }));
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Suite worker failed: {}", e);
            }
        }

        let state = Arc::try_unwrap(state)
            .map_err(|_| anyhow::anyhow!("Run state still shared after all workers finished"))?;
        Ok(state.into_report(None, requested))
    }

    async fn execute(&self, suite: Arc<Suite>) -> Result<SuiteOutcome> {
        let logger = Arc::clone(&self.logger);
        tokio::task::spawn_blocking(move || SuiteExecutor::new(&logger).run(&suite))
            .await
            .context("Suite worker failed")
    }
}
