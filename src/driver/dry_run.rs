//! Driver that only logs what it is asked to do
//!
//! Useful for checking control flow of a script without a browser. It
//! remembers the last URL so `getLocation` can be verified.

use tracing::info;

use super::Driver;
use crate::common::Result;

#[derive(Debug, Default)]
pub struct DryRunDriver {
    location: Option<String>,
    executed: Vec<String>,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every navigation and command seen so far, in order
    pub fn history(&self) -> &[String] {
        &self.executed
    }
}

impl Driver for DryRunDriver {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        info!(" - navigate: {}", url);
        self.executed.push(format!("open {}", url));
        self.location = Some(url.to_string());
        Ok(())
    }

    fn execute(&mut self, command: &str, args: &[String]) -> Result<Option<String>> {
        info!(" - {} {:?}", command, args);
        self.executed.push(format!("{} {}", command, args.join(" ")).trim_end().to_string());
        match command {
            "getLocation" => Ok(self.location.clone()),
            _ => Ok(None),
        }
    }
}
