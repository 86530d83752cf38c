//! Configuration module
//!
//! Handles loading and layering runner configuration. Precedence, highest
//! first: command line, environment, configuration file, defaults.

pub mod env;
pub mod file;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::session::DEFAULT_PENDING_CAPACITY;
use crate::utils::logger::LogLevel;
use env::EnvConfig;

/// Number of hardware threads, or 1 when it cannot be determined
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum suites running at once; hardware parallelism when unset
    pub max_workers: Option<usize>,

    /// Emit ANSI colours for severity tags
    pub color: bool,

    /// Lines a waiting suite may queue before it blocks
    pub pending_capacity: usize,

    /// Tracing level for diagnostics on stderr
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            color: true,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if file::is_yaml_file(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Resolve the configuration file (explicit path, environment, or the
    /// standard locations) and apply environment overrides on top
    pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(file::find);

        let config = match path {
            Some(path) => Self::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Self::default(),
        };

        if env.has_any() {
            debug!("Applying environment overrides: {:?}", env);
        }
        Ok(config.with_env(env))
    }

    /// Apply environment overrides
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(jobs) = env.jobs {
            self.max_workers = Some(jobs);
        }
        if let Some(color) = env.color {
            self.color = color;
        }
        if let Some(capacity) = env.pending_capacity {
            self.pending_capacity = capacity;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        self
    }

    /// Worker count to schedule with, never less than 1
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .unwrap_or_else(default_worker_count)
            .max(1)
    }

    /// Parsed log level, falling back to info
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(config.color);
        assert_eq!(config.max_workers, None);
        assert!(config.worker_count() >= 1);
        assert_eq!(config.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_worker_count_never_zero() {
        let config = RunnerConfig {
            max_workers: Some(0),
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_yaml_round_trip_with_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suite-runner.yaml");
        std::fs::write(&path, "max_workers: 3\ncolor: false\n").unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.max_workers, Some(3));
        assert!(!config.color);
        assert_eq!(config.pending_capacity, DEFAULT_PENDING_CAPACITY);

        let json = dir.path().join("config.json");
        std::fs::write(&json, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(RunnerConfig::load(&json).unwrap(), config);
    }

    #[test]
    fn test_env_overrides_file() {
        let env = EnvConfig {
            jobs: Some(7),
            color: Some(false),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        let config = RunnerConfig::default().with_env(&env);
        assert_eq!(config.worker_count(), 7);
        assert!(!config.color);
        assert_eq!(config.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runner.json");
        std::fs::write(&path, r#"{ "max_workers": 2 }"#).unwrap();

        let config = RunnerConfig::resolve(Some(path.as_path()), &EnvConfig::default()).unwrap();
        assert_eq!(config.max_workers, Some(2));

        let missing = dir.path().join("missing.yaml");
        assert!(RunnerConfig::resolve(Some(missing.as_path()), &EnvConfig::default()).is_err());
    }
}
