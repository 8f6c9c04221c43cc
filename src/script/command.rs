//! Executable command nodes
//!
//! A [`Script`] is the parsed form of a test case. Each [`Command`] knows how
//! to run itself against a [`Context`] and which command comes next, which
//! is how `goto` and `goto_if` form loops and branches.

use std::collections::HashMap;
use std::fmt;

use tracing::info;

use super::config::Step;
use super::context::Context;
use crate::common::{Error, Result};
use crate::outcome::Outcome;

/// One step of a test case, bound to its position
#[derive(Debug, Clone)]
pub struct Command {
    /// 1-based position within the case
    index: usize,
    step: Step,
    /// Resolved position of the label for `goto`/`goto_if`
    target: Option<usize>,
}

impl Command {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Run the command. Per-command driver failures become
    /// [`Outcome::Error`]; any other error is returned as is.
    pub fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        match &self.step {
            Step::Open { url } => {
                let url = ctx.resolve_url(&ctx.expand(url));
                match command_result(ctx.driver().navigate(&url))? {
                    Ok(()) => Ok(Outcome::Success),
                    Err(outcome) => Ok(outcome),
                }
            }
            Step::Execute { command, args, store } => {
                let args = expand_all(ctx, args);
                let value = match command_result(ctx.driver().execute(command, &args))? {
                    Ok(value) => value,
                    Err(outcome) => return Ok(outcome),
                };
                if let Some(var) = store {
                    ctx.set_var(var.as_str(), value.clone().unwrap_or_default());
                }
                ctx.set_last_value(value);
                Ok(Outcome::Success)
            }
            Step::Verify { command, args, expected, warn_only } => {
                let args = expand_all(ctx, args);
                let expected = ctx.expand(expected);
                let value = match command_result(ctx.driver().execute(command, &args))? {
                    Ok(value) => value,
                    Err(outcome) => return Ok(outcome),
                };
                let actual = value.clone().unwrap_or_default();
                ctx.set_last_value(value);
                if actual == expected {
                    return Ok(Outcome::Success);
                }
                let message = format!(
                    "[{}] {}: expected '{}', got '{}'",
                    self.index, command, expected, actual
                );
                Ok(if *warn_only {
                    Outcome::Warning(message)
                } else {
                    Outcome::Failure(message)
                })
            }
            Step::Store { var, value } => {
                let value = ctx.expand(value);
                ctx.set_var(var.as_str(), value);
                Ok(Outcome::Success)
            }
            Step::Increment { var, by } => {
                let current = ctx.var(var).unwrap_or("0");
                match current.trim().parse::<i64>() {
                    Ok(n) => match n.checked_add(*by) {
                        Some(sum) => {
                            ctx.set_var(var.as_str(), sum.to_string());
                            Ok(Outcome::Success)
                        }
                        None => Ok(Outcome::Error(format!(
                            "[{}] cannot increment '{}': overflow",
                            self.index, var
                        ))),
                    },
                    Err(_) => Ok(Outcome::Error(format!(
                        "[{}] cannot increment '{}': '{}' is not a number",
                        self.index, var, current
                    ))),
                }
            }
            Step::Echo { message } => {
                info!(" - echo: {}", ctx.expand(message));
                Ok(Outcome::Success)
            }
            Step::Label { .. } | Step::Goto { .. } | Step::GotoIf { .. } => Ok(Outcome::Success),
            Step::Abort { message } => Ok(Outcome::Interrupted(ctx.expand(message))),
        }
    }

    /// Position of the command to run after this one, `None` at the end.
    pub fn next(&self, ctx: &Context<'_>) -> Option<usize> {
        let following = Some(self.index);
        match &self.step {
            Step::Goto { .. } => self.target,
            Step::GotoIf { var, equals, not_equals, .. } => {
                let value = ctx.var(var).unwrap_or("");
                let jump = match (equals, not_equals) {
                    (Some(expected), None) => value == ctx.expand(expected),
                    (None, Some(unexpected)) => value != ctx.expand(unexpected),
                    _ => false,
                };
                if jump {
                    self.target
                } else {
                    following
                }
            }
            _ => following,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.index)?;
        match &self.step {
            Step::Open { url } => write!(f, "open {}", url),
            Step::Execute { command, args, .. } => write!(f, "{} {:?}", command, args),
            Step::Verify { command, args, expected, .. } => {
                write!(f, "verify {} {:?} == {:?}", command, args, expected)
            }
            Step::Store { var, value } => write!(f, "store {} = {:?}", var, value),
            Step::Increment { var, by } => write!(f, "increment {} by {}", var, by),
            Step::Echo { message } => write!(f, "echo {:?}", message),
            Step::Label { name } => write!(f, "label {}", name),
            Step::Goto { label } => write!(f, "goto {}", label),
            Step::GotoIf { var, label, .. } => write!(f, "goto_if {} -> {}", var, label),
            Step::Abort { message } => write!(f, "abort {:?}", message),
        }
    }
}

/// Split driver errors into per-command outcomes and run-aborting faults
fn command_result<T>(result: Result<T>) -> Result<std::result::Result<T, Outcome>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e @ Error::CommandFailed { .. }) => Ok(Err(Outcome::Error(e.to_string()))),
        Err(e) => Err(e),
    }
}

fn expand_all(ctx: &Context<'_>, args: &[String]) -> Vec<String> {
    args.iter().map(|arg| ctx.expand(arg)).collect()
}

/// The parsed command sequence of one test case
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    /// Bind steps to positions and resolve labels.
    ///
    /// Fails on duplicate labels, jumps to unknown labels and `goto_if`
    /// steps without exactly one condition.
    pub fn build(steps: Vec<Step>) -> std::result::Result<Self, String> {
        let mut labels = HashMap::new();
        for (pos, step) in steps.iter().enumerate() {
            if let Step::Label { name } = step {
                if labels.insert(name.clone(), pos).is_some() {
                    return Err(format!("duplicate label '{}'", name));
                }
            }
        }

        let commands = steps
            .into_iter()
            .enumerate()
            .map(|(pos, step)| {
                let target = match &step {
                    Step::Goto { label } => Some(resolve_label(&labels, label, pos)?),
                    Step::GotoIf { label, equals, not_equals, .. } => {
                        if equals.is_some() == not_equals.is_some() {
                            return Err(format!(
                                "step {}: goto_if needs exactly one of 'equals' or 'not_equals'",
                                pos + 1
                            ));
                        }
                        Some(resolve_label(&labels, label, pos)?)
                    }
                    _ => None,
                };
                Ok(Command {
                    index: pos + 1,
                    step,
                    target,
                })
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;

        Ok(Self { commands })
    }

    /// First command, `None` for an empty case
    pub fn head(&self) -> Option<&Command> {
        self.commands.first()
    }

    pub fn get(&self, position: usize) -> Option<&Command> {
        self.commands.get(position)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn resolve_label(
    labels: &HashMap<String, usize>,
    label: &str,
    pos: usize,
) -> std::result::Result<usize, String> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| format!("step {}: unknown label '{}'", pos + 1, label))
}
