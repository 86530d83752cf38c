//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Worker count from SUITE_RUNNER_JOBS
    pub jobs: Option<usize>,
    /// Colour output from SUITE_RUNNER_COLOR
    pub color: Option<bool>,
    /// Pending queue capacity from SUITE_RUNNER_PENDING
    pub pending_capacity: Option<usize>,
    /// Log level from SUITE_RUNNER_LOG
    pub log_level: Option<String>,
    /// Config file from SUITE_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            jobs: get_env_parse("JOBS"),
            color: get_env_bool("COLOR"),
            pending_capacity: get_env_parse("PENDING"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.jobs.is_some()
            || self.color.is_some()
            || self.pending_capacity.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all SUITE_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_JOBS      Maximum suites running at once");
    println!("  {ENV_PREFIX}_COLOR     Colour output (true/false)");
    println!("  {ENV_PREFIX}_PENDING   Lines a waiting suite may queue");
    println!("  {ENV_PREFIX}_LOG       Diagnostic log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG    Path to configuration file");
}
