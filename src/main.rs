//! Suite Runner - runs the bundled demonstration suites
//!
//! ## Usage
//!
//! ```bash
//! # Run every registered suite concurrently
//! suite-runner
//!
//! # Run specific suites in order
//! suite-runner Essential "Container Tests"
//!
//! # Limit concurrency and write a JSON report
//! suite-runner --jobs 2 --report reports/run.json
//!
//! # List suites
//! suite-runner --list
//! ```

use anyhow::Result;
use clap::Parser;

use suite_runner::app;
use suite_runner::cli::Args;
use suite_runner::config::env::EnvConfig;
use suite_runner::demos;
use suite_runner::registry::SuiteRegistry;
use suite_runner::utils::{init_logger, install_panic_hook};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config = app::resolve_config(&args, &env)?;

    init_logger(config.log_level());
    install_panic_hook();

    let mut registry = SuiteRegistry::new();
    demos::register_all(&mut registry)?;

    let status = app::run(&args, &config, registry).await?;
    std::process::exit(app::exit_code(status));
}
