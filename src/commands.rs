//! CLI command definitions
//!
//! Defines the clap commands for the script runner.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test case or test suite files
    Run {
        /// Script files, run in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Base URL overriding the one declared by each test case
        #[arg(long)]
        base_url: Option<String>,

        /// Directory screenshots are moved into
        #[arg(long)]
        screenshot_dir: Option<PathBuf>,

        /// Capture a screenshot after every command
        #[arg(long)]
        screenshot_all: bool,

        /// Capture a screenshot after every failing command
        #[arg(long)]
        screenshot_on_fail: bool,

        /// Write JUnit XML reports (TEST-<suite>.xml) into this directory
        #[arg(long)]
        result_dir: Option<PathBuf>,

        /// Number of files run in parallel, each on its own driver
        #[arg(long, short = 'j')]
        jobs: Option<usize>,

        /// Browser driver backend
        #[arg(long, value_enum, default_value = "dry-run")]
        driver: DriverKind,
    },

    /// Check that script files parse, without running them
    Check {
        /// Script files; suites are checked with all their children
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Available driver backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverKind {
    /// Log every command instead of driving a browser
    DryRun,
}
