//! Browser driver capability
//!
//! The runner never talks to a browser itself. Everything it needs from one
//! goes through [`Driver`]: navigation, named commands and screenshots.

mod dry_run;

use std::path::PathBuf;

use crate::common::{Error, Result};

pub use dry_run::DryRunDriver;

/// A browser automation backend
///
/// `execute` should return [`Error::CommandFailed`] when a single command
/// fails (missing element, bad locator, ...). Any other error is treated as
/// a fault in the backend and aborts the run.
pub trait Driver {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Load `url` in the browser
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Run a named command, returning the value it produced, if any
    fn execute(&mut self, command: &str, args: &[String]) -> Result<Option<String>>;

    fn supports_screenshot(&self) -> bool {
        false
    }

    /// Capture the current page into a temporary image file
    fn capture_screenshot(&mut self) -> Result<PathBuf> {
        Err(Error::ScreenshotUnsupported(self.name().to_string()))
    }
}
