//! Script file classification
//!
//! A file is either a suite (`suite:` key) or a case (`case:` key). Anything
//! else, or any file that cannot be read or parsed, is an invalid script.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::command::Script;
use super::config::{CaseFile, Step, SuiteFile};
use crate::common::{Error, Result};

static NEXT_SUITE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one suite instance, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteId(u64);

/// A named group of case (or nested suite) files
#[derive(Debug)]
pub struct TestSuite {
    id: SuiteId,
    name: String,
    path: PathBuf,
    children: Vec<PathBuf>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, children: Vec<PathBuf>) -> Self {
        Self {
            id: SuiteId(NEXT_SUITE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            path: path.into(),
            children,
        }
    }

    pub fn id(&self) -> SuiteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Child files in declaration order
    pub fn children(&self) -> &[PathBuf] {
        &self.children
    }
}

/// A named step sequence with its declared base URL
#[derive(Debug, Clone)]
pub struct TestCase {
    name: String,
    path: PathBuf,
    base_url: String,
    steps: Vec<Step>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        base_url: impl Into<String>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            base_url: base_url.into(),
            steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the executable command sequence
    pub fn parse(&self) -> Result<Script> {
        Script::build(self.steps.clone()).map_err(|reason| Error::invalid_script(&self.path, reason))
    }
}

/// What a script file turned out to be
#[derive(Debug)]
pub enum Descriptor {
    Suite(TestSuite),
    Case(TestCase),
}

/// Read a script file and decide whether it is a suite or a case
pub fn classify(path: &Path) -> Result<Descriptor> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::invalid_script(path, format!("cannot read file: {}", e)))?;

    let value: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|e| Error::invalid_script(path, format!("malformed YAML: {}", e)))?;

    let mapping = value
        .as_mapping()
        .ok_or_else(|| Error::invalid_script(path, "expected a mapping at the top level"))?;

    if mapping.contains_key("suite") {
        let file: SuiteFile = serde_yaml::from_value(value)
            .map_err(|e| Error::invalid_script(path, format!("bad suite: {}", e)))?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let children = file
            .cases
            .into_iter()
            .map(|child| if child.is_relative() { dir.join(child) } else { child })
            .collect();
        Ok(Descriptor::Suite(TestSuite::new(
            non_blank_or_stem(file.suite, path),
            path,
            children,
        )))
    } else if mapping.contains_key("case") {
        let file: CaseFile = serde_yaml::from_value(value)
            .map_err(|e| Error::invalid_script(path, format!("bad case: {}", e)))?;
        Ok(Descriptor::Case(TestCase::new(
            non_blank_or_stem(file.case, path),
            path,
            file.base_url,
            file.steps,
        )))
    } else {
        Err(Error::invalid_script(
            path,
            "expected a 'suite' or 'case' key",
        ))
    }
}

fn non_blank_or_stem(name: String, path: &Path) -> String {
    if !name.trim().is_empty() {
        return name;
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}
