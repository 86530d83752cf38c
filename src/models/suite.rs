//! Suite definitions and abort signals

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::executor::TestContext;

/// Early-exit signal returned by a body
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Abort {
    #[error("test aborted")]
    Test,

    #[error("suite aborted")]
    Suite,

    #[error("run aborted")]
    All,
}

/// What a setup, test, or teardown body returns. `Ok(())` means continue.
pub type Outcome = Result<(), Abort>;

/// Shared body of a hook or test
pub type Body = Arc<dyn Fn(&mut TestContext<'_>) -> Outcome + Send + Sync>;

/// A named test body inside a suite
#[derive(Clone)]
pub struct TestEntry {
    pub name: String,
    pub body: Body,
}

impl fmt::Debug for TestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEntry").field("name", &self.name).finish()
    }
}

/// A named group of tests sharing one optional setup/teardown pair
#[derive(Clone)]
pub struct Suite {
    name: String,
    setup: Option<Body>,
    teardown: Option<Body>,
    tests: Vec<TestEntry>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            teardown: None,
            tests: Vec::new(),
        }
    }

    pub fn setup<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(body));
        self
    }

    pub fn teardown<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.teardown = Some(Arc::new(body));
        self
    }

    /// Add a test. Tests run in the order they are added.
    pub fn test<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut TestContext<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.tests.push(TestEntry {
            name: name.into(),
            body: Arc::new(body),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup_hook(&self) -> Option<&Body> {
        self.setup.as_ref()
    }

    pub fn teardown_hook(&self) -> Option<&Body> {
        self.teardown.as_ref()
    }

    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    /// First test name that appears more than once, if any
    pub fn duplicate_test(&self) -> Option<&str> {
        self.tests.iter().enumerate().find_map(|(i, entry)| {
            self.tests[..i]
                .iter()
                .any(|earlier| earlier.name == entry.name)
                .then_some(entry.name.as_str())
        })
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("tests", &self.tests)
            .finish()
    }
}
