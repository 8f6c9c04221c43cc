//! Command evaluation loop and screenshot capture

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use crate::common::Result;
use crate::driver::Driver;
use crate::outcome::Outcome;
use crate::script::{Context, Script};

/// Walks a script, command by command, and totals the outcomes
#[derive(Debug, Clone, Default)]
pub struct Executor {
    screenshot_dir: Option<PathBuf>,
    screenshot_all: bool,
    screenshot_on_fail: bool,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_screenshot_dir(&mut self, dir: Option<PathBuf>) {
        self.screenshot_dir = dir;
    }

    pub fn set_screenshot_all(&mut self, enabled: bool) {
        self.screenshot_all = enabled;
    }

    pub fn set_screenshot_on_fail(&mut self, enabled: bool) {
        self.screenshot_on_fail = enabled;
    }

    /// Run `script` from its first command.
    ///
    /// Stops early once the running total is interrupted. Successors come
    /// from each command, so loops revisit earlier commands.
    pub fn evaluate(&self, ctx: &mut Context<'_>, script: &Script) -> Result<Outcome> {
        let mut total = Outcome::Success;
        let mut current = script.head();
        while let Some(command) = current {
            info!("{}", command);
            let outcome = command.execute(ctx)?;
            if self.screenshot_all || (self.screenshot_on_fail && outcome.is_failed()) {
                self.take_screenshot(ctx.driver(), command.index());
            }
            total = total.combine(outcome);
            if total.is_interrupted() {
                break;
            }
            current = command.next(ctx).and_then(|pos| script.get(pos));
        }
        Ok(total)
    }

    /// Capture a screenshot named after the current time and `index`.
    ///
    /// Best effort: problems are logged, never returned.
    pub fn take_screenshot(&self, driver: &mut dyn Driver, index: usize) -> Option<PathBuf> {
        if !driver.supports_screenshot() {
            warn!("driver '{}' does not support taking screenshots", driver.name());
            return None;
        }
        let captured = match driver.capture_screenshot() {
            Ok(path) => path,
            Err(e) => {
                error!("failed to capture screenshot: {}", e);
                return None;
            }
        };
        let ext = captured
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());
        let dir = self.screenshot_dir.as_deref().unwrap_or(Path::new("."));
        let target = dir.join(screenshot_file_name(
            &Local::now().format("%Y%m%d%H%M%S%3f").to_string(),
            index,
            &ext,
        ));
        if let Err(e) = move_file(&captured, &target) {
            error!("failed to move screenshot to {}: {}", target.display(), e);
            return None;
        }
        info!(" - capture screenshot: {}", target.display());
        Some(target)
    }
}

/// `capture_<timestamp>_<index>.<ext>`
pub fn screenshot_file_name(timestamp: &str, index: usize, ext: &str) -> String {
    format!("capture_{}_{}.{}", timestamp, index, ext)
}

/// Rename, falling back to copy + remove when crossing filesystems
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::script::Step;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Driver that answers commands from a fixed table and records calls
    struct ScriptedDriver {
        calls: Rc<RefCell<Vec<String>>>,
        shots: Option<PathBuf>,
    }

    impl ScriptedDriver {
        fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            (Self { calls: calls.clone(), shots: None }, calls)
        }
    }

    impl Driver for ScriptedDriver {
        fn name(&self) -> &str {
            "scripted"
        }

        fn navigate(&mut self, url: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("open {}", url));
            Ok(())
        }

        fn execute(&mut self, command: &str, _args: &[String]) -> Result<Option<String>> {
            self.calls.borrow_mut().push(command.to_string());
            match command {
                "missing" => Err(Error::command_failed(command, "no such element")),
                "crash" => Err(Error::Driver("browser went away".into())),
                "getTitle" => Ok(Some("Home".into())),
                _ => Ok(None),
            }
        }

        fn supports_screenshot(&self) -> bool {
            self.shots.is_some()
        }

        fn capture_screenshot(&mut self) -> Result<PathBuf> {
            let dir = self.shots.as_ref().expect("screenshots enabled");
            let path = dir.join(format!("raw{}.png", self.calls.borrow().len()));
            fs::write(&path, b"\x89PNG")?;
            Ok(path)
        }
    }

    fn exec(command: &str) -> Step {
        Step::Execute { command: command.into(), args: vec![], store: None }
    }

    #[test]
    fn test_evaluate_aggregates_to_most_severe() {
        let (mut driver, calls) = ScriptedDriver::new();
        let script = Script::build(vec![
            exec("click"),
            Step::Verify {
                command: "getTitle".into(),
                args: vec![],
                expected: "Login".into(),
                warn_only: false,
            },
            exec("missing"),
            exec("click"),
        ])
        .unwrap();

        let mut ctx = Context::new(&mut driver, "");
        let total = Executor::new().evaluate(&mut ctx, &script).unwrap();

        assert!(matches!(total, Outcome::Error(ref m) if m.contains("no such element")));
        assert_eq!(calls.borrow().len(), 4);
    }

    #[test]
    fn test_interrupted_stops_the_loop() {
        let (mut driver, calls) = ScriptedDriver::new();
        let script = Script::build(vec![
            exec("first"),
            Step::Abort { message: "enough".into() },
            exec("never"),
        ])
        .unwrap();

        let mut ctx = Context::new(&mut driver, "");
        let total = Executor::new().evaluate(&mut ctx, &script).unwrap();

        assert_eq!(total, Outcome::Interrupted("enough".into()));
        assert_eq!(*calls.borrow(), ["first"]);
    }

    #[test]
    fn test_loop_revisits_commands() {
        let (mut driver, calls) = ScriptedDriver::new();
        let script = Script::build(vec![
            Step::Store { var: "i".into(), value: "0".into() },
            Step::Label { name: "again".into() },
            exec("click"),
            Step::Increment { var: "i".into(), by: 1 },
            Step::GotoIf {
                var: "i".into(),
                equals: None,
                not_equals: Some("3".into()),
                label: "again".into(),
            },
            exec("done"),
        ])
        .unwrap();

        let mut ctx = Context::new(&mut driver, "");
        let total = Executor::new().evaluate(&mut ctx, &script).unwrap();

        assert_eq!(total, Outcome::Success);
        assert_eq!(*calls.borrow(), ["click", "click", "click", "done"]);
        assert_eq!(ctx.var("i"), Some("3"));
    }

    #[test]
    fn test_driver_fault_propagates() {
        let (mut driver, calls) = ScriptedDriver::new();
        let script = Script::build(vec![exec("crash"), exec("never")]).unwrap();

        let mut ctx = Context::new(&mut driver, "");
        let err = Executor::new().evaluate(&mut ctx, &script).unwrap_err();

        assert!(matches!(err, Error::Driver(_)));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_screenshot_file_name_pattern() {
        let stamp = Local::now().format("%Y%m%d%H%M%S%3f").to_string();
        let name = screenshot_file_name(&stamp, 7, "png");
        let digits = &name["capture_".len()..name.len() - "_7.png".len()];
        assert_eq!(digits.len(), 17);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert!(name.starts_with("capture_") && name.ends_with("_7.png"));
    }

    #[test]
    fn test_screenshot_all_moves_captures() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let (mut driver, _) = ScriptedDriver::new();
        driver.shots = Some(raw.path().to_path_buf());
        let script = Script::build(vec![exec("click"), exec("click")]).unwrap();

        let mut executor = Executor::new();
        executor.set_screenshot_dir(Some(out.path().to_path_buf()));
        executor.set_screenshot_all(true);
        let mut ctx = Context::new(&mut driver, "");
        executor.evaluate(&mut ctx, &script).unwrap();

        let mut names: Vec<String> = fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort_by_key(|n| n.ends_with("_2.png"));
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("capture_") && names[0].ends_with("_1.png"));
        assert!(names[1].ends_with("_2.png"));
        assert_eq!(fs::read_dir(raw.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_screenshot_on_fail_only_captures_failures() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let (mut driver, _) = ScriptedDriver::new();
        driver.shots = Some(raw.path().to_path_buf());
        let script = Script::build(vec![exec("click"), exec("missing"), exec("click")]).unwrap();

        let mut executor = Executor::new();
        executor.set_screenshot_dir(Some(out.path().to_path_buf()));
        executor.set_screenshot_on_fail(true);
        let mut ctx = Context::new(&mut driver, "");
        executor.evaluate(&mut ctx, &script).unwrap();

        let names: Vec<String> = fs::read_dir(out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("_2.png"));
    }

    #[test]
    fn test_screenshot_unsupported_is_a_no_op() {
        let (mut driver, _) = ScriptedDriver::new();
        assert!(Executor::new().take_screenshot(&mut driver, 1).is_none());
    }
}
