//! Script runner
//!
//! Runs suite and case files: suites recurse into their children, cases are
//! parsed into a [`Script`] and handed to the [`Executor`]. Suite and case
//! lifecycles are bracketed with [`ReportTracker`] events.
//!
//! A malformed script counts as a failed test. Any other error stops the
//! run and is returned to the caller.

mod executor;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::common::logging::format_duration;
use crate::common::{Error, Result};
use crate::driver::Driver;
use crate::outcome::Outcome;
use crate::report::{ReportTracker, SuiteStack};
use crate::script::{classify, Context, Descriptor, Script, TestCase, TestSuite};

pub use executor::{screenshot_file_name, Executor};

/// Runs script files on one worker with one driver
pub struct Runner {
    driver: Box<dyn Driver + Send>,
    executor: Executor,
    base_url: String,
    reports: Arc<ReportTracker>,
    suites: SuiteStack,
    /// Canonical paths of the suite files currently being run
    open_files: Vec<PathBuf>,
}

impl Runner {
    /// Runner with reporting disabled
    pub fn new(driver: Box<dyn Driver + Send>) -> Self {
        Self::with_reports(driver, Arc::new(ReportTracker::new(None)))
    }

    /// Runner sharing `reports` with other workers
    pub fn with_reports(driver: Box<dyn Driver + Send>, reports: Arc<ReportTracker>) -> Self {
        Self {
            driver,
            executor: Executor::new(),
            base_url: String::new(),
            reports,
            suites: SuiteStack::new(),
            open_files: Vec::new(),
        }
    }

    pub fn set_screenshot_dir(&mut self, dir: Option<PathBuf>) {
        self.executor.set_screenshot_dir(dir);
    }

    pub fn set_screenshot_all(&mut self, enabled: bool) {
        self.executor.set_screenshot_all(enabled);
    }

    pub fn set_screenshot_on_fail(&mut self, enabled: bool) {
        self.executor.set_screenshot_on_fail(enabled);
    }

    /// Base URL override; blank means "use each case's own"
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn reports(&self) -> &Arc<ReportTracker> {
        &self.reports
    }

    /// Base URL a case actually runs against
    pub fn effective_base_url(&self, case: &TestCase) -> String {
        if self.base_url.trim().is_empty() {
            case.base_url().to_string()
        } else {
            self.base_url.clone()
        }
    }

    /// Run one suite or case file
    pub fn run(&mut self, path: &Path) -> Result<Outcome> {
        let _timer = RunTimer::start(path);
        match self.run_file(path) {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_invalid_script() => {
                error!("{}", e);
                Ok(Outcome::Failure(e.to_string()))
            }
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }

    /// Run files in order; only an unrecoverable error stops the batch
    pub fn run_all<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<Outcome> {
        let mut total = Outcome::Success;
        for path in paths {
            total = total.combine(self.run(path.as_ref())?);
        }
        Ok(total)
    }

    fn run_file(&mut self, path: &Path) -> Result<Outcome> {
        let descriptor = match classify(path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.record_invalid(&TestCase::new(file_stem(path), path, "", vec![]), &e);
                return Err(e);
            }
        };
        match descriptor {
            Descriptor::Suite(suite) => {
                let canonical = canonical_path(path);
                if self.open_files.contains(&canonical) {
                    let e = Error::invalid_script(path, "suite includes itself");
                    self.record_invalid(&TestCase::new(suite.name(), path, "", vec![]), &e);
                    return Err(e);
                }
                self.open_files.push(canonical);
                let outcome = self.run_suite(&suite);
                self.open_files.pop();
                outcome
            }
            Descriptor::Case(case) => {
                if self.suites.is_empty() {
                    // a lone case still gets a report of its own
                    let suite = TestSuite::new(case.name(), case.path(), vec![]);
                    self.bracket_suite(&suite, |runner| runner.run_case(&case))
                } else {
                    self.run_case(&case)
                }
            }
        }
    }

    fn run_suite(&mut self, suite: &TestSuite) -> Result<Outcome> {
        info!("Test suite: {}", suite.name());
        self.bracket_suite(suite, |runner| {
            let mut total = Outcome::Success;
            for child in suite.children() {
                total = total.combine(runner.run(child)?);
            }
            Ok(total)
        })
    }

    /// Keep the suite open while `body` runs, closing it on every path
    fn bracket_suite(
        &mut self,
        suite: &TestSuite,
        body: impl FnOnce(&mut Self) -> Result<Outcome>,
    ) -> Result<Outcome> {
        self.reports.start_test_suite(&mut self.suites, suite)?;
        let outcome = body(self);
        let closed = self.reports.end_test_suite(&mut self.suites);
        match (outcome, closed) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_error)) => {
                error!("Closing suite '{}' failed: {}", suite.name(), close_error);
                Err(e)
            }
        }
    }

    fn run_case(&mut self, case: &TestCase) -> Result<Outcome> {
        info!("Test case: {}", case.name());
        let base_url = self.effective_base_url(case);
        info!("Base URL: {}", base_url);
        let script = match case.parse() {
            Ok(script) => script,
            Err(e) => {
                self.record_invalid(case, &e);
                return Err(e);
            }
        };

        self.reports.start_test_case(&self.suites, case);
        let outcome = self.evaluate_case(&script, base_url);
        match &outcome {
            Ok(Outcome::Failure(message)) | Ok(Outcome::Interrupted(message)) => {
                self.reports.add_failure_message(&self.suites, message)
            }
            Ok(Outcome::Error(message)) => {
                self.reports.add_error(&self.suites, &Error::Command(message.clone()))
            }
            Ok(_) => {}
            Err(e) => self.reports.add_error(&self.suites, e),
        }
        self.reports.end_test_case(&self.suites);
        outcome
    }

    /// Report a malformed script as a failed test case of the open suite
    fn record_invalid(&self, case: &TestCase, error: &Error) {
        if !error.is_invalid_script() {
            return;
        }
        self.reports.start_test_case(&self.suites, case);
        self.reports.add_failure(&self.suites, error);
        self.reports.end_test_case(&self.suites);
    }

    fn evaluate_case(&mut self, script: &Script, base_url: String) -> Result<Outcome> {
        let mut ctx = Context::new(self.driver.as_mut(), base_url);
        self.executor.evaluate(&mut ctx, script)
    }
}

fn canonical_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Logs the start of a file run and, on drop, its end and duration
struct RunTimer {
    name: String,
    started: Instant,
}

impl RunTimer {
    fn start(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Start: {}", name);
        Self {
            name,
            started: Instant::now(),
        }
    }
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        info!("End({}): {}", format_duration(self.started.elapsed()), self.name);
    }
}
