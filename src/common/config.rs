//! Configuration file handling
//!
//! Every value here can also be given on the command line; flags win.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Script execution settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// JUnit report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Script execution settings
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Base URL that overrides the one declared by each test case
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory screenshots are moved into
    #[serde(default)]
    pub screenshot_dir: Option<PathBuf>,

    /// Capture a screenshot after every command
    #[serde(default)]
    pub screenshot_all: bool,

    /// Capture a screenshot after every failing command
    #[serde(default)]
    pub screenshot_on_fail: bool,

    /// Number of worker threads for top-level files
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            screenshot_dir: None,
            screenshot_all: false,
            screenshot_on_fail: false,
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> usize {
    1
}

/// JUnit report settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReportConfig {
    /// Directory for `TEST-<suite>.xml` files; reporting is off when unset
    #[serde(default)]
    pub result_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.runner.jobs == 0 {
            config.runner.jobs = 1;
        }
        Ok(config)
    }
}
