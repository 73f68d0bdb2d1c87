//! The `CommandLine` value: one external command, ready to echo or spawn.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external command with its arguments, working directory, and extra environment.
///
/// `Display` renders the command as it is echoed to the user. The working
/// directory and environment are not part of the echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, OsString)>,
    script: bool,
}

impl CommandLine {
    /// A program invoked directly, without a shell.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            script: false,
        }
    }

    /// A command line interpreted by `sh -c`, for globs and redirections.
    pub fn script(text: impl Into<String>) -> Self {
        Self {
            script: true,
            ..Self::new(text)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_env(&self, key: &str) -> Option<&OsString> {
        self.env.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Build the `std::process::Command` that executes this line.
    pub fn to_command(&self) -> Command {
        let mut command = if self.script {
            let mut sh = Command::new("sh");
            sh.arg("-c").arg(self.to_string());
            sh
        } else {
            let mut direct = Command::new(&self.program);
            direct.args(&self.args);
            direct
        };
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() {
        "''".to_string()
    } else if arg.contains(char::is_whitespace) {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if self.script {
                write!(f, " {arg}")?;
            } else {
                write!(f, " {}", quote(arg))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_joins_arguments() {
        let cmd = CommandLine::new("make")
            .args(["all-gcc", "-j", "12"])
            .current_dir("/tmp");
        assert_eq!(cmd.to_string(), "make all-gcc -j 12");
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn echo_quotes_whitespace() {
        let cmd = CommandLine::new("cmake").arg("-DCMAKE_C_FLAGS=-O2 -g");
        assert_eq!(cmd.to_string(), "cmake '-DCMAKE_C_FLAGS=-O2 -g'");
    }

    #[test]
    fn script_is_echoed_verbatim() {
        let cmd = CommandLine::script("strip lib/*.so");
        assert_eq!(cmd.to_string(), "strip lib/*.so");
        let std_cmd = cmd.to_command();
        assert_eq!(std_cmd.get_program(), "sh");
    }

    #[test]
    fn last_env_wins() {
        let cmd = CommandLine::new("configure")
            .env("ORIGIN", "a")
            .env("ORIGIN", "$$ORIGIN");
        assert_eq!(cmd.get_env("ORIGIN").unwrap(), "$$ORIGIN");
        assert!(cmd.get_env("PATH").is_none());
    }
}
