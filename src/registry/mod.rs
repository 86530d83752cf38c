//! Suite registry
//!
//! Holds every registered suite in registration order. The registry is
//! populated before a run and shared read-only through an `Arc` afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::models::Suite;

/// Registration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("suite name must not be empty")]
    EmptyName,

    #[error("suite \"{0}\" is already registered")]
    DuplicateSuite(String),

    #[error("suite \"{suite}\" declares test \"{test}\" more than once")]
    DuplicateTest { suite: String, test: String },
}

/// Mapping from suite name to definition
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    suites: Vec<Arc<Suite>>,
    index: HashMap<String, usize>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite under its name
    pub fn register(&mut self, suite: Suite) -> Result<(), RegistryError> {
        if suite.name().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(suite.name()) {
            return Err(RegistryError::DuplicateSuite(suite.name().to_string()));
        }
        if let Some(test) = suite.duplicate_test() {
            return Err(RegistryError::DuplicateTest {
                suite: suite.name().to_string(),
                test: test.to_string(),
            });
        }

        debug!(
            "Registered suite '{}' with {} tests",
            suite.name(),
            suite.tests().len()
        );
        self.index.insert(suite.name().to_string(), self.suites.len());
        self.suites.push(Arc::new(suite));
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, suite: Suite) -> Result<Self, RegistryError> {
        self.register(suite)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Suite>> {
        self.index.get(name).map(|&i| &self.suites[i])
    }

    /// Suites in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Suite>> {
        self.suites.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
