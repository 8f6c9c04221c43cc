//! Per-suite report writers
//!
//! A writer is created when a suite starts and consumed when it ends. The
//! JUnit variant opens its output file up front, collects case events in
//! memory and serializes the whole `<testsuite>` element on `finish`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::common::{Error, Result};
use crate::script::TestCase;

/// Writer bound to one open suite
#[derive(Debug)]
pub enum ReportWriter {
    /// Reporting is not configured; every event is dropped
    Disabled,
    Junit(JunitWriter),
}

impl ReportWriter {
    /// Open `TEST-<suite>.xml` in `dir`, or a disabled writer when `dir` is `None`
    pub fn open(dir: Option<&Path>, suite_name: &str) -> Result<Self> {
        match dir {
            Some(dir) => Ok(Self::Junit(JunitWriter::create(dir, suite_name)?)),
            None => Ok(Self::Disabled),
        }
    }

    pub fn start_case(&mut self, case: &TestCase) {
        if let Self::Junit(writer) = self {
            writer.start_case(case);
        }
    }

    pub fn end_case(&mut self) {
        if let Self::Junit(writer) = self {
            writer.end_case();
        }
    }

    pub fn add_error(&mut self, error: &Error) {
        if let Self::Junit(writer) = self {
            writer.add_problem(ProblemKind::Error, error.kind(), error.to_string(), error_chain(error));
        }
    }

    pub fn add_failure(&mut self, error: &Error) {
        if let Self::Junit(writer) = self {
            writer.add_problem(ProblemKind::Failure, error.kind(), error.to_string(), error_chain(error));
        }
    }

    pub fn add_failure_message(&mut self, message: &str) {
        if let Self::Junit(writer) = self {
            writer.add_problem(
                ProblemKind::Failure,
                "AssertionFailed",
                message.to_string(),
                message.to_string(),
            );
        }
    }

    /// Write the suite element, flush and close the output
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Disabled => Ok(()),
            Self::Junit(writer) => writer.finish(),
        }
    }

    /// Output file, if this writer produces one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Disabled => None,
            Self::Junit(writer) => Some(&writer.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProblemKind {
    Failure,
    Error,
}

#[derive(Debug)]
struct Problem {
    kind: ProblemKind,
    type_name: String,
    message: String,
    detail: String,
}

#[derive(Debug)]
struct CaseRecord {
    name: String,
    started: Instant,
    elapsed: Option<Duration>,
    problems: Vec<Problem>,
}

/// JUnit XML writer for one suite
#[derive(Debug)]
pub struct JunitWriter {
    out: BufWriter<File>,
    path: PathBuf,
    suite: String,
    timestamp: DateTime<Local>,
    started: Instant,
    cases: Vec<CaseRecord>,
    /// Case that has started but not yet ended
    current: Option<usize>,
}

impl JunitWriter {
    pub fn create(dir: &Path, suite_name: &str) -> Result<Self> {
        let path = dir.join(report_file_name(suite_name));
        let file = fs::create_dir_all(dir)
            .and_then(|_| File::create(&path))
            .map_err(|source| Error::ReportCreate {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            out: BufWriter::new(file),
            path,
            suite: suite_name.to_string(),
            timestamp: Local::now(),
            started: Instant::now(),
            cases: Vec::new(),
            current: None,
        })
    }

    fn start_case(&mut self, case: &TestCase) {
        self.cases.push(CaseRecord {
            name: case.name().to_string(),
            started: Instant::now(),
            elapsed: None,
            problems: Vec::new(),
        });
        self.current = Some(self.cases.len() - 1);
    }

    fn end_case(&mut self) {
        if let Some(pos) = self.current.take() {
            let record = &mut self.cases[pos];
            record.elapsed = Some(record.started.elapsed());
        }
    }

    fn add_problem(&mut self, kind: ProblemKind, type_name: &str, message: String, detail: String) {
        if let Some(pos) = self.current {
            self.cases[pos].problems.push(Problem {
                kind,
                type_name: type_name.to_string(),
                message,
                detail,
            });
        }
    }

    fn finish(self) -> Result<()> {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());
        let JunitWriter {
            mut out,
            suite,
            timestamp,
            started,
            cases,
            ..
        } = self;

        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8" ?>"#)?;
        writeln!(
            out,
            r#"<testsuite errors="{}" failures="{}" hostname="{}" name="{}" skipped="0" tests="{}" time="{}" timestamp="{}">"#,
            count(&cases, ProblemKind::Error),
            count(&cases, ProblemKind::Failure),
            escape(&hostname),
            escape(&suite),
            cases.len(),
            seconds(started.elapsed()),
            timestamp.format("%Y-%m-%dT%H:%M:%S"),
        )?;
        writeln!(out, "  <properties />")?;
        for case in &cases {
            let elapsed = case.elapsed.unwrap_or_else(|| case.started.elapsed());
            write!(
                out,
                r#"  <testcase classname="{}" name="{}" time="{}""#,
                escape(&suite),
                escape(&case.name),
                seconds(elapsed),
            )?;
            if case.problems.is_empty() {
                writeln!(out, " />")?;
                continue;
            }
            writeln!(out, ">")?;
            for problem in &case.problems {
                let tag = match problem.kind {
                    ProblemKind::Failure => "failure",
                    ProblemKind::Error => "error",
                };
                writeln!(
                    out,
                    r#"    <{tag} message="{}" type="{}">{}</{tag}>"#,
                    escape(&problem.message),
                    escape(&problem.type_name),
                    escape(&problem.detail),
                )?;
            }
            writeln!(out, "  </testcase>")?;
        }
        writeln!(out, "  <system-out><![CDATA[]]></system-out>")?;
        writeln!(out, "  <system-err><![CDATA[]]></system-err>")?;
        writeln!(out, "</testsuite>")?;
        out.flush()?;
        Ok(())
    }
}

/// Number of cases with at least one problem of `kind`
fn count(cases: &[CaseRecord], kind: ProblemKind) -> usize {
    cases
        .iter()
        .filter(|case| case.problems.iter().any(|p| p.kind == kind))
        .count()
}

/// `TEST-<suite>.xml`, with path separators replaced
pub fn report_file_name(suite_name: &str) -> String {
    let safe: String = suite_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("TEST-{}.xml", safe)
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\n' | '\r' | '\t') => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str) -> TestCase {
        TestCase::new(name, format!("{}.yaml", name), "", vec![])
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("Smoke"), "TEST-Smoke.xml");
        assert_eq!(report_file_name("a/b:c"), "TEST-a_b_c.xml");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;");
        assert_eq!(escape("bell\u{7}"), "bell");
    }

    #[test]
    fn test_disabled_writer_creates_nothing() {
        let mut writer = ReportWriter::open(None, "Smoke").unwrap();
        writer.start_case(&case("login"));
        writer.add_failure_message("nope");
        writer.end_case();
        assert!(writer.path().is_none());
        writer.finish().unwrap();
    }

    #[test]
    fn test_junit_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ReportWriter::open(Some(dir.path()), "Smoke & Co").unwrap();
        writer.start_case(&case("login"));
        writer.end_case();
        writer.start_case(&case("search"));
        writer.add_failure_message("expected 'Results', got 'Error'");
        writer.end_case();
        writer.start_case(&case("checkout"));
        writer.add_error(&Error::Driver("session lost".into()));
        writer.end_case();
        // after end_case there is no current case; this must be dropped
        writer.add_failure_message("stray");
        let path = writer.path().unwrap().to_path_buf();
        writer.finish().unwrap();

        let xml = fs::read_to_string(&path).unwrap();
        assert!(path.ends_with("TEST-Smoke & Co.xml"));
        assert!(xml.contains(r#"name="Smoke &amp; Co""#));
        assert!(xml.contains(r#"errors="1" failures="1""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"<testcase classname="Smoke &amp; Co" name="login""#));
        assert!(xml.contains(r#"message="expected &apos;Results&apos;, got &apos;Error&apos;" type="AssertionFailed""#));
        assert!(xml.contains(r#"<error message="Driver error: session lost" type="DriverError">"#));
        assert!(!xml.contains("stray"));
        assert!(xml.trim_end().ends_with("</testsuite>"));
    }

    #[test]
    fn test_create_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let err = ReportWriter::open(Some(&blocker), "Smoke").unwrap_err();
        assert!(matches!(err, Error::ReportCreate { .. }));
    }
}
