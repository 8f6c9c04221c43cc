//! Selenese runner - executes YAML browser test scripts
//!
//! This library runs test cases and suites against a [`driver::Driver`],
//! totals their outcomes and writes JUnit XML reports per suite.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod script;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use outcome::{Outcome, Severity};
pub use report::{ReportTracker, SuiteStack};
pub use runner::{Executor, Runner};
