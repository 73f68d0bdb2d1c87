//! A scripted `Shell` for tests.
//!
//! `RecordingShell` never spawns processes. It records every echoed command
//! and filesystem operation, can be told to fail matching commands a fixed
//! number of times, can return canned captured output, and can apply a
//! filesystem side effect when a matching command "runs" (for example, a
//! half-finished clone directory).

use std::cell::RefCell;

use crate::command::CommandLine;
use crate::error::{Result, ShellError};
use crate::fs::FsOp;
use crate::shell::{Captured, RunOptions, Shell};

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A command that would have been spawned.
    Command(String),
    /// A command that was echoed under dry-run.
    DryCommand(String),
    /// A filesystem operation that was applied.
    Fs(String),
    /// A filesystem operation that was suppressed by dry-run.
    DryFs(String),
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    remaining: Option<usize>,
}

/// A shell double that records instead of executing.
#[derive(Debug, Default)]
pub struct RecordingShell {
    dry_run: bool,
    apply_fs: bool,
    events: RefCell<Vec<Event>>,
    failures: RefCell<Vec<Rule>>,
    responses: RefCell<Vec<(String, Captured)>>,
    effects: RefCell<Vec<(String, FsOp)>>,
}

impl RecordingShell {
    /// Records commands and applies filesystem operations for real.
    pub fn new() -> Self {
        Self {
            apply_fs: true,
            ..Self::default()
        }
    }

    /// Records everything and applies nothing.
    pub fn dry() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Fail the next `times` commands whose echo contains `pattern`.
    pub fn fail_times(self, pattern: &str, times: usize) -> Self {
        self.failures.borrow_mut().push(Rule {
            pattern: pattern.to_string(),
            remaining: Some(times),
        });
        self
    }

    /// Fail every command whose echo contains `pattern`.
    pub fn fail_always(self, pattern: &str) -> Self {
        self.failures.borrow_mut().push(Rule {
            pattern: pattern.to_string(),
            remaining: None,
        });
        self
    }

    /// Return `output` when a captured command matching `pattern` runs.
    pub fn respond(self, pattern: &str, output: Captured) -> Self {
        self.responses.borrow_mut().push((pattern.to_string(), output));
        self
    }

    /// Apply `op` whenever a command matching `pattern` runs, before it succeeds or fails.
    pub fn effect(self, pattern: &str, op: FsOp) -> Self {
        self.effects.borrow_mut().push((pattern.to_string(), op));
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Commands that were (or under dry-run, would have been) executed.
    pub fn commands(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) | Event::DryCommand(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of commands whose echo contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.commands().iter().filter(|c| c.contains(pattern)).count()
    }

    /// Filesystem operations that were actually applied.
    pub fn applied_fs_ops(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Fs(op) => Some(op.clone()),
                _ => None,
            })
            .collect()
    }

    fn should_fail(&self, echo: &str) -> bool {
        let mut failures = self.failures.borrow_mut();
        for rule in failures.iter_mut().filter(|r| echo.contains(&r.pattern)) {
            match rule.remaining.as_mut() {
                None => return true,
                Some(0) => continue,
                Some(n) => {
                    *n -= 1;
                    return true;
                }
            }
        }
        false
    }
}

impl Shell for RecordingShell {
    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn run(&self, command: &CommandLine, options: RunOptions) -> Result<Option<Captured>> {
        let echo = command.to_string();
        if options.dry_run || self.dry_run {
            self.events.borrow_mut().push(Event::DryCommand(echo));
            return Ok(None);
        }
        self.events.borrow_mut().push(Event::Command(echo.clone()));

        let effects: Vec<FsOp> = self
            .effects
            .borrow()
            .iter()
            .filter(|(p, _)| echo.contains(p.as_str()))
            .map(|(_, op)| op.clone())
            .collect();
        for op in effects {
            op.apply().map_err(|source| ShellError::Fs {
                operation: op.to_string(),
                path: op.destination().to_path_buf(),
                source,
            })?;
        }

        if self.should_fail(&echo) {
            if options.ignore_error {
                return Ok(None);
            }
            return Err(ShellError::CommandFailed {
                command: echo,
                status: Some(1),
            });
        }
        if !options.capture {
            return Ok(None);
        }
        let response = self
            .responses
            .borrow()
            .iter()
            .find(|(p, _)| echo.contains(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or(Captured {
                status: Some(0),
                ..Captured::default()
            });
        Ok(Some(response))
    }

    fn apply(&self, op: &FsOp) -> Result<()> {
        if self.dry_run || !self.apply_fs {
            self.events.borrow_mut().push(Event::DryFs(op.to_string()));
            return Ok(());
        }
        self.events.borrow_mut().push(Event::Fs(op.to_string()));
        op.apply().map_err(|source| ShellError::Fs {
            operation: op.to_string(),
            path: op.destination().to_path_buf(),
            source,
        })
    }
}
