//! Bootstrap stages and the persisted cursor that makes them resumable.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toolchains_shell::{FsOp, Shell};

use crate::error::{BuildError, Result};

/// One pass of the self-hosting LLVM build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Compiler with the host's toolchain, then runtimes for every target.
    Bootstrap,
    /// Compiler again, linked against the stage-1 runtimes.
    Compiler,
    /// Runtimes again, built by the stage-2 compiler.
    Runtimes,
    /// Move the new install over the old one and package it.
    Install,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Bootstrap, Stage::Compiler, Stage::Runtimes, Stage::Install];

    pub fn number(self) -> u8 {
        match self {
            Stage::Bootstrap => 1,
            Stage::Compiler => 2,
            Stage::Runtimes => 3,
            Stage::Install => 4,
        }
    }

    pub fn from_number(number: u8) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|s| s.number() == number)
            .ok_or_else(|| BuildError::InvalidOption {
                detail: format!("stage should range from 1 to 4, got {number}"),
            })
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.number() == self.number() + 1)
    }

    /// This stage and every later one.
    pub fn remaining(self) -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().filter(move |s| *s >= self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Stage::Bootstrap => "bootstrap compiler and runtimes",
            Stage::Compiler => "self-hosted compiler",
            Stage::Runtimes => "self-hosted runtimes",
            Stage::Install => "install and package",
        };
        write!(f, "stage {} ({what})", self.number())
    }
}

/// Where a bootstrap run should begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartAt {
    #[default]
    Beginning,
    /// After the last stage recorded in the state file.
    Resume,
    Stage(Stage),
}

/// The last completed stage and the prefixes produced so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapState {
    /// 0 before the first stage completes.
    completed: u8,
    prefixes: Vec<PathBuf>,
}

impl BootstrapState {
    /// Read the state file. A missing file is a fresh state.
    pub fn load(path: &Path) -> Result<Self> {
        let invalid = |reason: String| BuildError::BootstrapState {
            path: path.to_path_buf(),
            reason,
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(invalid(e.to_string())),
        };
        let state: Self = toml::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        if state.completed != 0 {
            Stage::from_number(state.completed).map_err(|e| invalid(e.to_string()))?;
        }
        Ok(state)
    }

    /// Write the state file through `shell`, so a dry run leaves it alone.
    pub fn save<S: Shell + ?Sized>(&self, shell: &S, path: &Path) -> Result<()> {
        let contents = toml::to_string(self).map_err(|e| BuildError::BootstrapState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        shell.apply(&FsOp::WriteFile {
            path: path.to_path_buf(),
            contents,
        })?;
        Ok(())
    }

    pub fn completed(&self) -> Option<Stage> {
        Stage::from_number(self.completed).ok()
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    /// The stage a run should start at. `None` when everything is done.
    pub fn start(&self, start: StartAt) -> Option<Stage> {
        match start {
            StartAt::Beginning => Some(Stage::Bootstrap),
            StartAt::Stage(stage) => Some(stage),
            StartAt::Resume => match self.completed() {
                None => Some(Stage::Bootstrap),
                Some(stage) => stage.next(),
            },
        }
    }

    pub fn record(&mut self, stage: Stage, prefix: &Path) {
        self.completed = stage.number();
        if !self.prefixes.iter().any(|p| p == prefix) {
            self.prefixes.push(prefix.to_path_buf());
        }
    }
}
