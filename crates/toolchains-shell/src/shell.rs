//! The `Shell` trait and the process-spawning `SystemShell`.

use std::path::Path;

use log::{debug, info, warn};

use crate::command::CommandLine;
use crate::error::{Result, ShellError};
use crate::fs::FsOp;

/// Per-call execution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Log and swallow a non-zero exit instead of failing.
    pub ignore_error: bool,
    /// Return stdout/stderr instead of inheriting the terminal.
    pub capture: bool,
    /// Echo the command before running it.
    pub echo: bool,
    /// Echo only; never spawn.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ignore_error: false,
            capture: false,
            echo: true,
            dry_run: false,
        }
    }
}

impl RunOptions {
    pub fn ignore_error(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Output of a captured command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// The only way the rest of the workspace spawns processes or mutates the filesystem.
///
/// `run` returns `Ok(None)` when nothing was executed (dry-run), when a
/// failure was ignored, or when output was not captured.
pub trait Shell {
    /// Whether the global dry-run flag is set.
    fn dry_run(&self) -> bool;

    fn run(&self, command: &CommandLine, options: RunOptions) -> Result<Option<Captured>>;

    fn apply(&self, op: &FsOp) -> Result<()>;

    /// Run with the default policy: echo, fail on non-zero exit.
    fn exec(&self, command: &CommandLine) -> Result<()> {
        self.run(command, RunOptions::default()).map(|_| ())
    }

    /// Read-only existence probe. Never affected by dry-run.
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }
}

/// A shell that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemShell {
    dry_run: bool,
}

impl SystemShell {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl Shell for SystemShell {
    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn run(&self, command: &CommandLine, options: RunOptions) -> Result<Option<Captured>> {
        let dry_run = options.dry_run || self.dry_run;
        if options.echo {
            info!("run command: {command}");
        } else {
            debug!("run command: {command}");
        }
        if let Some(dir) = command.get_current_dir() {
            debug!("  in {}", dir.display());
        }
        if dry_run {
            return Ok(None);
        }

        let mut process = command.to_command();
        let spawn_error = |source| ShellError::Spawn {
            command: command.to_string(),
            source,
        };
        let (status, captured) = if options.capture {
            let output = process.output().map_err(spawn_error)?;
            let captured = Captured {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            (output.status, Some(captured))
        } else {
            (process.status().map_err(spawn_error)?, None)
        };

        if status.success() {
            return Ok(captured);
        }
        if options.ignore_error {
            warn!(
                "command \"{command}\" failed with status {:?}, but it is ignored",
                status.code()
            );
            return Ok(None);
        }
        Err(ShellError::CommandFailed {
            command: command.to_string(),
            status: status.code(),
        })
    }

    fn apply(&self, op: &FsOp) -> Result<()> {
        debug!("{op}");
        if self.dry_run {
            return Ok(());
        }
        op.apply().map_err(|source| ShellError::Fs {
            operation: op.to_string(),
            path: op.destination().to_path_buf(),
            source,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output() {
        let shell = SystemShell::new(false);
        let out = shell
            .run(&CommandLine::script("echo hello; echo oops >&2"), RunOptions::default().capture())
            .unwrap()
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.status, Some(0));
    }

    #[test]
    fn failure_is_typed() {
        let shell = SystemShell::new(false);
        let err = shell.exec(&CommandLine::script("exit 3")).unwrap_err();
        assert!(matches!(err, ShellError::CommandFailed { status: Some(3), .. }));
    }

    #[test]
    fn ignored_failure_returns_none() {
        let shell = SystemShell::new(false);
        let out = shell
            .run(&CommandLine::script("exit 1"), RunOptions::default().ignore_error().capture())
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn dry_run_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let shell = SystemShell::new(true);
        let cmd = CommandLine::new("touch").path_arg(&marker);
        assert!(shell.run(&cmd, RunOptions::default()).unwrap().is_none());
        shell
            .apply(&FsOp::CreateDir { path: dir.path().join("d"), clean: true })
            .unwrap();
        assert!(!marker.exists());
        assert!(!dir.path().join("d").exists());
    }

    #[test]
    fn per_call_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let shell = SystemShell::new(false);
        let cmd = CommandLine::new("touch").path_arg(&marker);
        shell.run(&cmd, RunOptions::default().dry_run(true)).unwrap();
        assert!(!marker.exists());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let shell = SystemShell::new(false);
        let err = shell
            .exec(&CommandLine::new("definitely-not-a-real-program-xyz"))
            .unwrap_err();
        assert!(matches!(err, ShellError::Spawn { .. }));
    }
}
