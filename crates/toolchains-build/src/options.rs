//! Options shared by every toolchain build.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use toolchains_shell::default_jobs;
use toolchains_source::default_home;
use toolchains_triplet::Triplet;

use crate::error::{BuildError, Result};

/// Options for the GCC family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GccOptions {
    /// The machine the builds run on.
    pub build: Triplet,
    /// Directory holding the source components.
    pub home: PathBuf,
    /// Directory under which every toolchain is installed.
    pub prefix_dir: PathBuf,
    /// Directory with `.gdbinit`, `python_config.sh`, linker scripts and `readme/`.
    pub data_dir: PathBuf,
    /// Build gdb alongside binutils.
    pub gdb: bool,
    /// Build gdbserver for linux targets.
    pub gdbserver: bool,
    /// Build newlib for freestanding targets.
    pub newlib: bool,
    pub jobs: usize,
}

/// `<home>/toolchains/data`, where the packaging resources are installed.
pub fn default_data_dir() -> PathBuf {
    default_home().join("toolchains").join("data")
}

impl Default for GccOptions {
    fn default() -> Self {
        Self {
            build: Triplet::build_default(),
            home: default_home(),
            prefix_dir: default_home(),
            data_dir: default_data_dir(),
            gdb: true,
            gdbserver: true,
            newlib: true,
            jobs: default_jobs(),
        }
    }
}

impl GccOptions {
    pub fn validate(&self) -> Result<()> {
        validate_common(self.jobs, &self.home)
    }
}

/// Options for the LLVM family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlvmOptions {
    pub build: Triplet,
    /// The machine the produced compiler runs on.
    pub host: Triplet,
    pub home: PathBuf,
    /// Where the GCC toolchains that seed the sysroot are installed.
    pub gcc_prefix_dir: PathBuf,
    pub data_dir: PathBuf,
    pub jobs: usize,
}

impl Default for LlvmOptions {
    fn default() -> Self {
        Self {
            build: Triplet::build_default(),
            host: Triplet::build_default(),
            home: default_home(),
            gcc_prefix_dir: default_home(),
            data_dir: default_data_dir(),
            jobs: default_jobs(),
        }
    }
}

impl LlvmOptions {
    pub fn validate(&self) -> Result<()> {
        validate_common(self.jobs, &self.home)
    }
}

fn validate_common(jobs: usize, home: &std::path::Path) -> Result<()> {
    if jobs == 0 {
        return Err(BuildError::InvalidOption {
            detail: "jobs must be positive".into(),
        });
    }
    if !home.is_dir() {
        return Err(BuildError::InvalidOption {
            detail: format!("home directory {} does not exist", home.display()),
        });
    }
    Ok(())
}
