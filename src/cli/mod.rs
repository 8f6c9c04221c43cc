//! CLI command handling
//!
//! Builds runners from flags and configuration, runs them and prints a
//! summary. Returns the process exit code.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use colored::Colorize;

use crate::commands::{Commands, DriverKind};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::driver::{Driver, DryRunDriver};
use crate::outcome::{Outcome, Severity};
use crate::report::ReportTracker;
use crate::runner::Runner;
use crate::script::{classify, Descriptor};

/// Settings for one `run` invocation, flags merged over the config file
#[derive(Debug, Clone)]
struct RunSettings {
    base_url: String,
    screenshot_dir: Option<PathBuf>,
    screenshot_all: bool,
    screenshot_on_fail: bool,
    result_dir: Option<PathBuf>,
    jobs: usize,
    driver: DriverKind,
}

/// Dispatch a CLI command
pub fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<u8> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match command {
        Commands::Run {
            files,
            base_url,
            screenshot_dir,
            screenshot_all,
            screenshot_on_fail,
            result_dir,
            jobs,
            driver,
        } => {
            let settings = RunSettings {
                base_url: base_url.or(config.runner.base_url).unwrap_or_default(),
                screenshot_dir: screenshot_dir.or(config.runner.screenshot_dir),
                screenshot_all: screenshot_all || config.runner.screenshot_all,
                screenshot_on_fail: screenshot_on_fail || config.runner.screenshot_on_fail,
                result_dir: result_dir.or(config.report.result_dir),
                jobs: jobs.unwrap_or(config.runner.jobs).max(1),
                driver,
            };
            run(&files, &settings)
        }

        Commands::Check { files } => check(&files),
    }
}

fn make_driver(kind: DriverKind) -> Box<dyn Driver + Send> {
    match kind {
        DriverKind::DryRun => Box::new(DryRunDriver::new()),
    }
}

fn make_runner(settings: &RunSettings, reports: Arc<ReportTracker>) -> Result<Runner> {
    if let Some(dir) = &settings.screenshot_dir {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Config(format!(
                "Cannot create screenshot directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }
    let mut runner = Runner::with_reports(make_driver(settings.driver), reports);
    runner.set_base_url(settings.base_url.as_str());
    runner.set_screenshot_dir(settings.screenshot_dir.clone());
    runner.set_screenshot_all(settings.screenshot_all);
    runner.set_screenshot_on_fail(settings.screenshot_on_fail);
    Ok(runner)
}

fn run(files: &[PathBuf], settings: &RunSettings) -> Result<u8> {
    let reports = Arc::new(ReportTracker::new(settings.result_dir.clone()));

    let total = if settings.jobs <= 1 || files.len() <= 1 {
        make_runner(settings, reports)?.run_all(files)?
    } else {
        run_parallel(files, settings, reports)?
    };

    print_summary(&total);
    Ok(total.exit_code())
}

/// Spread top-level files round-robin over `settings.jobs` workers
fn run_parallel(
    files: &[PathBuf],
    settings: &RunSettings,
    reports: Arc<ReportTracker>,
) -> Result<Outcome> {
    let workers = settings.jobs.min(files.len());
    let mut buckets: Vec<Vec<PathBuf>> = vec![Vec::new(); workers];
    for (i, file) in files.iter().enumerate() {
        buckets[i % workers].push(file.clone());
    }

    let results: Vec<Result<Outcome>> = thread::scope(|scope| {
        let handles: Vec<_> = buckets
            .iter()
            .map(|bucket| {
                let reports = Arc::clone(&reports);
                scope.spawn(move || make_runner(settings, reports)?.run_all(bucket.as_slice()))
            })
            .collect();
        handles.into_iter().map(join_worker).collect()
    });

    let mut total = Outcome::Success;
    for result in results {
        total = total.combine(result?);
    }
    Ok(total)
}

fn join_worker(handle: thread::ScopedJoinHandle<'_, Result<Outcome>>) -> Result<Outcome> {
    handle.join().unwrap_or_else(|_| Err(Error::WorkerPanicked))
}

fn print_summary(total: &Outcome) {
    let label = match total.severity() {
        Severity::Success => "✓ Passed".green().bold(),
        Severity::Warning => "✓ Passed with warnings".yellow().bold(),
        Severity::Failure => "✗ Failed".red().bold(),
        Severity::Error => "✗ Error".red().bold(),
        Severity::Interrupted => "✗ Interrupted".red().bold(),
    };
    println!("\n{}", label);
    if let Some(message) = total.message() {
        for line in message.lines() {
            println!("  {}", line.dimmed());
        }
    }
}

fn check(files: &[PathBuf]) -> Result<u8> {
    let mut invalid = 0;
    for file in files {
        invalid += check_file(file, &mut Vec::new());
    }
    if invalid == 0 {
        println!("\n{}", "✓ All scripts are valid".green().bold());
        Ok(0)
    } else {
        println!("\n{} {}", "✗ Invalid scripts:".red().bold(), invalid);
        Ok(1)
    }
}

/// Validate `path` (and a suite's children); returns the number of invalid files.
/// `open` holds the canonical paths of the enclosing suites.
fn check_file(path: &Path, open: &mut Vec<PathBuf>) -> usize {
    let indent = "  ".repeat(open.len() + 1);
    let result = classify(path).and_then(|descriptor| match descriptor {
        Descriptor::Case(case) => case.parse().map(|script| {
            println!(
                "{}{} {} ({} steps)",
                indent,
                "✓".green(),
                case.name(),
                script.len()
            );
            0
        }),
        Descriptor::Suite(suite) => {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if open.contains(&canonical) {
                return Err(Error::invalid_script(path, "suite includes itself"));
            }
            println!("{}{} suite {}", indent, "✓".green(), suite.name());
            open.push(canonical);
            let invalid = suite
                .children()
                .iter()
                .map(|child| check_file(child, open))
                .sum::<usize>();
            open.pop();
            Ok(invalid)
        }
    });
    match result {
        Ok(invalid) => invalid,
        Err(e) => {
            println!("{}{} {}", indent, "✗".red(), e);
            1
        }
    }
}
