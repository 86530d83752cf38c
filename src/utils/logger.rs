//! Logging utilities
//!
//! Diagnostics go to stderr through tracing so they never interleave with
//! suite output on stdout.

use std::sync::Once;
use tracing::{debug, error, Level};
use tracing_subscriber::EnvFilter;

use crate::executor;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(format!("suite_runner={}", level.to_tracing_level()))
}

/// Initialize the logger with specified level.
///
/// A second call is a no-op; the first subscriber stays installed.
pub fn init_logger(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Install a panic hook that keeps panics caught inside suite code off
/// stderr.
///
/// Panics raised under `executor::catch` only leave their location behind
/// for the runner's own report and a debug-level trace. Any other panic is a
/// runner fault and goes to the previous hook. Installing twice is a no-op.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !executor::capturing_panics() {
                error!("Runner panicked outside suite code");
                previous(info);
                return;
            }

            let message = executor::panic_message(info.payload());
            match info.location() {
                Some(location) => {
                    executor::note_panic_location(location.file(), location.line());
                    debug!("panic at {}:{}: {}", location.file(), location.line(), message);
                }
                None => debug!("panic at unknown location: {}", message),
            }
        }));
    });
}
