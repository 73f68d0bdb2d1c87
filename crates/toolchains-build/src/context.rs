//! The `BuildContext`: PATH and working directory carried between build steps.
//!
//! Steps never touch the process environment. Each step receives a context,
//! and returns the context the next step should see. Commands are created
//! through [`BuildContext::command`] so that they inherit the registered
//! PATH and the current directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;
use toolchains_shell::CommandLine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Registered `bin/` directories, most recently registered first.
    registered: Vec<PathBuf>,
    /// The PATH inherited from the caller, appended after the registered entries.
    base_path: OsString,
    cwd: Option<PathBuf>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::from_env()
    }
}

impl BuildContext {
    /// A context whose base PATH is the current process PATH.
    pub fn from_env() -> Self {
        Self::with_base_path(std::env::var_os("PATH").unwrap_or_default())
    }

    pub fn with_base_path(base_path: impl Into<OsString>) -> Self {
        Self {
            registered: Vec::new(),
            base_path: base_path.into(),
            cwd: None,
        }
    }

    /// Put `bin` in front of the PATH. Registering twice moves it to the front.
    pub fn register(mut self, bin: impl Into<PathBuf>) -> Self {
        let bin = bin.into();
        self.registered.retain(|p| p != &bin);
        debug!("register PATH entry {}", bin.display());
        self.registered.insert(0, bin);
        self
    }

    /// Switch the working directory for subsequent commands.
    pub fn enter(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// The PATH value that spawned commands see.
    pub fn path_value(&self) -> OsString {
        let base = std::env::split_paths(&self.base_path);
        let entries: Vec<PathBuf> = self.registered.iter().cloned().chain(base).collect();
        // Entries never contain the separator: they are directories we computed.
        std::env::join_paths(entries).unwrap_or_else(|_| self.base_path.clone())
    }

    /// A command that runs in the current directory with the registered PATH.
    pub fn command(&self, program: impl Into<String>) -> CommandLine {
        self.prepare(CommandLine::new(program))
    }

    /// Like [`command`](Self::command), but interpreted by `sh -c`.
    pub fn script(&self, text: impl Into<String>) -> CommandLine {
        self.prepare(CommandLine::script(text))
    }

    fn prepare(&self, command: CommandLine) -> CommandLine {
        let command = command.env("PATH", self.path_value());
        match &self.cwd {
            Some(dir) => command.current_dir(dir),
            None => command,
        }
    }

    /// Resolve `program` against the registered PATH.
    pub fn which(&self, program: &str) -> Option<PathBuf> {
        let cwd = self.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        which::which_in(program, Some(self.path_value()), cwd).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_prepends_and_deduplicates() {
        let ctx = BuildContext::with_base_path("/usr/bin")
            .register("/opt/a/bin")
            .register("/opt/b/bin")
            .register("/opt/a/bin");
        assert_eq!(
            ctx.registered(),
            &[PathBuf::from("/opt/a/bin"), PathBuf::from("/opt/b/bin")]
        );
        let path: Vec<PathBuf> = std::env::split_paths(&ctx.path_value()).collect();
        assert_eq!(path.last(), Some(&PathBuf::from("/usr/bin")));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn commands_inherit_cwd_and_path() {
        let ctx = BuildContext::with_base_path("/usr/bin")
            .register("/opt/gcc/bin")
            .enter("/src/gcc/build");
        let cmd = ctx.command("make");
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/src/gcc/build")));
        let path = cmd.get_env("PATH").unwrap();
        assert!(path.to_string_lossy().starts_with("/opt/gcc/bin"));
    }

    #[cfg(unix)]
    #[test]
    fn which_uses_registered_entries() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let gcc = bin.join("arm-none-eabi-gcc");
        std::fs::write(&gcc, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&gcc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = BuildContext::with_base_path("");
        assert!(ctx.which("arm-none-eabi-gcc").is_none());
        let ctx = ctx.register(&bin);
        assert_eq!(ctx.which("arm-none-eabi-gcc"), Some(gcc));
    }
}
