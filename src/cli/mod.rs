//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

/// Concurrent test-suite runner
#[derive(Parser, Debug, Default)]
#[command(name = "suite-runner")]
#[command(version = "0.1.0")]
#[command(about = "Run registered test suites concurrently with contiguous per-suite output")]
#[command(long_about = None)]
pub struct Args {
    /// Suites to run, in order. Runs every registered suite when empty
    pub suites: Vec<String>,

    /// Maximum number of suites running at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,

    /// List registered suites and their tests
    #[arg(short, long)]
    pub list: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Show supported environment variables
    #[arg(long)]
    pub env_help: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
