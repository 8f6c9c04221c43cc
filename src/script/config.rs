//! Test script file types
//!
//! Defines the data structures for deserializing YAML suite and case files.

use serde::Deserialize;
use std::path::PathBuf;

/// A suite file: a named, ordered list of case (or nested suite) files
#[derive(Deserialize, Debug)]
pub struct SuiteFile {
    /// Name of the suite, also used for the report file name
    pub suite: String,
    /// Optional description of what the suite covers
    pub description: Option<String>,
    /// Child files, relative to the suite file
    pub cases: Vec<PathBuf>,
}

/// A case file: a named sequence of steps run against one base URL
#[derive(Deserialize, Debug)]
pub struct CaseFile {
    /// Name of the test case
    pub case: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Base URL relative `open` steps resolve against
    #[serde(default)]
    pub base_url: String,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

/// A single step in a test case
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL, relative to the base URL unless absolute
    Open { url: String },
    /// Run a driver command
    Execute {
        /// Driver command name (e.g. "click", "type", "getText")
        command: String,
        /// Command arguments; `${var}` references are expanded
        #[serde(default)]
        args: Vec<String>,
        /// Variable that receives the command's return value
        store: Option<String>,
    },
    /// Run a driver command and compare its value
    Verify {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Expected value (exact match)
        expected: String,
        /// Report a mismatch as a warning instead of a failure
        #[serde(default)]
        warn_only: bool,
    },
    /// Bind a variable
    Store { var: String, value: String },
    /// Add to a numeric variable (missing variables start at 0)
    Increment {
        var: String,
        #[serde(default = "default_increment")]
        by: i64,
    },
    /// Log a message
    Echo { message: String },
    /// Jump target for `goto` and `goto_if`
    Label { name: String },
    /// Continue at a label
    Goto { label: String },
    /// Continue at a label when a variable matches; exactly one of
    /// `equals` / `not_equals` must be set
    GotoIf {
        var: String,
        equals: Option<String>,
        not_equals: Option<String>,
        label: String,
    },
    /// Stop the test case
    Abort {
        #[serde(default = "default_abort_message")]
        message: String,
    },
}

fn default_increment() -> i64 {
    1
}

fn default_abort_message() -> String {
    "aborted by script".to_string()
}
