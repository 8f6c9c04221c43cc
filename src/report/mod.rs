//! JUnit report tracking
//!
//! Suites can nest and several workers can run suites at the same time.
//! Each worker owns a [`SuiteStack`] of the suites it has open; the writers
//! themselves live in a map shared by all workers, keyed by suite identity.
//! Case events always go to the innermost open suite of the calling worker.

mod junit;

use std::path::PathBuf;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::common::{Error, Result};
use crate::script::{SuiteId, TestCase, TestSuite};

pub use junit::{report_file_name, JunitWriter, ReportWriter};

/// Suites opened by one worker, innermost last
#[derive(Debug, Default)]
pub struct SuiteStack {
    suites: Vec<SuiteId>,
}

impl SuiteStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost open suite
    pub fn current(&self) -> Option<SuiteId> {
        self.suites.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

/// Routes suite and case lifecycle events to per-suite report writers
#[derive(Debug, Default)]
pub struct ReportTracker {
    result_dir: RwLock<Option<PathBuf>>,
    writers: DashMap<SuiteId, ReportWriter>,
}

impl ReportTracker {
    /// Tracker writing into `result_dir`; `None` disables reporting
    pub fn new(result_dir: Option<PathBuf>) -> Self {
        Self {
            result_dir: RwLock::new(result_dir),
            writers: DashMap::new(),
        }
    }

    /// Change the output directory for suites started from now on
    pub fn set_result_dir(&self, result_dir: Option<PathBuf>) {
        *self.result_dir.write() = result_dir;
    }

    pub fn result_dir(&self) -> Option<PathBuf> {
        self.result_dir.read().clone()
    }

    /// Open a writer for `suite` and make it the innermost suite of `stack`.
    ///
    /// Fails, leaving `stack` untouched, when the report file cannot be
    /// created.
    pub fn start_test_suite(&self, stack: &mut SuiteStack, suite: &TestSuite) -> Result<()> {
        let dir = self.result_dir();
        let writer = ReportWriter::open(dir.as_deref(), suite.name())?;
        if let Some(path) = writer.path() {
            debug!("report for suite '{}': {}", suite.name(), path.display());
        }
        self.writers.insert(suite.id(), writer);
        stack.suites.push(suite.id());
        Ok(())
    }

    /// Close the innermost suite of `stack` and write its report
    pub fn end_test_suite(&self, stack: &mut SuiteStack) -> Result<()> {
        let id = stack.suites.pop().ok_or(Error::NoActiveSuite)?;
        match self.writers.remove(&id) {
            Some((_, writer)) => writer.finish(),
            None => Ok(()),
        }
    }

    pub fn start_test_case(&self, stack: &SuiteStack, case: &TestCase) {
        self.with_current(stack, |writer| writer.start_case(case));
    }

    pub fn end_test_case(&self, stack: &SuiteStack) {
        self.with_current(stack, ReportWriter::end_case);
    }

    pub fn add_error(&self, stack: &SuiteStack, error: &Error) {
        self.with_current(stack, |writer| writer.add_error(error));
    }

    pub fn add_failure(&self, stack: &SuiteStack, error: &Error) {
        self.with_current(stack, |writer| writer.add_failure(error));
    }

    pub fn add_failure_message(&self, stack: &SuiteStack, message: &str) {
        self.with_current(stack, |writer| writer.add_failure_message(message));
    }

    /// Number of suites currently open across all workers
    pub fn open_suites(&self) -> usize {
        self.writers.len()
    }

    fn with_current(&self, stack: &SuiteStack, f: impl FnOnce(&mut ReportWriter)) {
        let Some(id) = stack.current() else {
            return;
        };
        if let Some(mut writer) = self.writers.get_mut(&id) {
            f(writer.value_mut());
        }
    }
}
