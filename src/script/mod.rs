//! Test scripts
//!
//! Reads YAML suite and case files and turns cases into executable
//! command sequences.

mod command;
mod config;
mod context;
mod parser;

pub use command::{Command, Script};
pub use config::*;
pub use context::Context;
pub use parser::{classify, Descriptor, SuiteId, TestCase, TestSuite};
