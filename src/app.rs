//! Process-level orchestration
//!
//! Turns parsed arguments and a populated registry into scheduler runs and
//! an exit status.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::Args;
use crate::config::env::{print_env_help, EnvConfig};
use crate::config::RunnerConfig;
use crate::executor::Scheduler;
use crate::models::RunReport;
use crate::output::RunLog;
use crate::registry::SuiteRegistry;
use crate::session::SessionLogger;

/// Highest exit code a process can report without truncation
const MAX_EXIT_CODE: u64 = 255;

/// Map a summed exit status onto a process exit code.
///
/// Only the low 8 bits survive on Unix, so the sum is clamped rather than
/// passed through; any non-zero status stays non-zero.
pub fn exit_code(status: u64) -> i32 {
    status.min(MAX_EXIT_CODE) as i32
}

/// Resolve configuration: file, then environment, then command line
pub fn resolve_config(args: &Args, env: &EnvConfig) -> Result<RunnerConfig> {
    let mut config = RunnerConfig::resolve(args.config.as_deref(), env)?;

    if let Some(jobs) = args.jobs {
        config.max_workers = Some(jobs);
    }
    if args.no_color {
        config.color = false;
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    Ok(config)
}

/// Lines printed by `--list`
pub fn list_lines(registry: &SuiteRegistry) -> Vec<String> {
    let mut lines = vec![format!("Registered suites ({} total)", registry.len())];
    for suite in registry.iter() {
        let hooks = match (suite.setup_hook().is_some(), suite.teardown_hook().is_some()) {
            (true, true) => " [setup, teardown]",
            (true, false) => " [setup]",
            (false, true) => " [teardown]",
            (false, false) => "",
        };
        lines.push(format!("  {}{}", suite.name(), hooks));
        for test in suite.tests() {
            lines.push(format!("    - {:?}", test.name));
        }
    }
    lines
}

/// Run against standard output and return the process exit status
pub async fn run(args: &Args, config: &RunnerConfig, registry: SuiteRegistry) -> Result<u64> {
    let logger = SessionLogger::stdout()
        .with_color(config.color)
        .with_pending_capacity(config.pending_capacity);
    execute(args, config, Arc::new(registry), Arc::new(logger)).await
}

/// Run the suites `args` selects through `logger`
pub async fn execute(
    args: &Args,
    config: &RunnerConfig,
    registry: Arc<SuiteRegistry>,
    logger: Arc<SessionLogger>,
) -> Result<u64> {
    if args.env_help {
        print_env_help();
        return Ok(0);
    }
    if args.list {
        for line in list_lines(&registry) {
            logger.println(line);
        }
        return Ok(0);
    }

    let started_at = Utc::now();
    let scheduler =
        Scheduler::new(registry, Arc::clone(&logger)).with_max_workers(config.worker_count());

    let runs = if args.suites.is_empty() {
        vec![scheduler.run(None).await?]
    } else {
        scheduler.run_each(&args.suites).await?
    };

    let log = RunLog::new(started_at, scheduler.max_workers(), runs);
    if let Some(path) = &args.report {
        log.save(path)
            .with_context(|| format!("Failed to save run report to {}", path.display()))?;
    }

    if log.runs.iter().all(RunReport::is_clean) {
        info!("All runs clean");
    } else {
        warn!("Exit status {}", log.exit_status);
    }
    Ok(log.exit_status)
}
