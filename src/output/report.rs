//! JSON run reports
//!
//! Persists the reports of one process invocation so runs can be inspected
//! or compared later.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

use crate::models::RunReport;

/// Everything one invocation ran
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunLog {
    /// Timestamp when the first run started
    pub started_at: DateTime<Utc>,

    /// Timestamp when the last run finished
    pub finished_at: DateTime<Utc>,

    /// Worker count the scheduler used
    pub workers: usize,

    /// Sum of the exit statuses of all runs
    pub exit_status: u64,

    /// One report per scheduler invocation, in execution order
    pub runs: Vec<RunReport>,
}

impl RunLog {
    pub fn new(started_at: DateTime<Utc>, workers: usize, runs: Vec<RunReport>) -> Self {
        let exit_status = runs.iter().map(|r| r.exit_status).sum();
        Self {
            started_at,
            finished_at: Utc::now(),
            workers,
            exit_status,
            runs,
        }
    }

    /// Write the log as pretty JSON, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create report directory")?;
        }

        let file = File::create(path).context("Failed to create report file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).context("Failed to write report")?;

        info!("Saved run report to {}", path.display());
        Ok(())
    }

    /// Load a previously saved log
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context("Failed to open report file")?;
        let reader = BufReader::new(file);

        let log: Self = serde_json::from_reader(reader).context("Failed to parse report")?;
        debug!("Loaded run report from {}", path.display());
        Ok(log)
    }
}
