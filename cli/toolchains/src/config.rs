//! The configuration file and how command-line flags layer over it.
//!
//! A configuration file has one table per option group:
//!
//! ```toml
//! [source]
//! remote = "tuna"
//! retry = 3
//!
//! [gcc]
//! jobs = 24
//! gdbserver = false
//!
//! [llvm]
//! home = "/opt/src"
//! ```
//!
//! Missing keys keep their compiled-in defaults. Flags given on the command
//! line override both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use toolchains_build::{GccOptions, LlvmOptions};
use toolchains_source::{AcquireOptions, CloneStrategy, Mirror};
use toolchains_triplet::Triplet;

/// Every option group the CLI knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for `*.toolchain.toml` build definitions.
    pub definitions: Option<PathBuf>,
    pub source: AcquireOptions,
    pub gcc: GccOptions,
    pub llvm: LlvmOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// The imported file, or the compiled-in defaults without one.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("serializing configuration")?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
    }
}

/// Source acquisition flags.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceFlags {
    /// Directory holding one subdirectory per source component
    #[arg(long)]
    pub home: Option<PathBuf>,
    /// Git history to fetch (partial, shallow, full)
    #[arg(long)]
    pub clone: Option<CloneStrategy>,
    /// History depth for shallow clones
    #[arg(long)]
    pub depth: Option<u32>,
    /// Use ssh URLs for github-hosted repositories
    #[arg(long)]
    pub ssh: Option<bool>,
    /// Preferred git remote (github, native, nju, tuna, bfsu, nyist, cernet)
    #[arg(long)]
    pub remote: Option<Mirror>,
    /// Retries after a failed network operation
    #[arg(long)]
    pub retry: Option<u32>,
    /// Optional archive to fetch as well (iconv, loongnix). Repeatable.
    #[arg(long = "extra-lib")]
    pub extra_libs: Vec<String>,
    /// glibc release branch to clone
    #[arg(long)]
    pub glibc_version: Option<String>,
}

impl SourceFlags {
    pub fn apply(&self, options: &mut AcquireOptions) {
        set(&mut options.home, &self.home);
        set(&mut options.clone, &self.clone);
        set(&mut options.depth, &self.depth);
        set(&mut options.ssh, &self.ssh);
        set(&mut options.remote, &self.remote);
        set(&mut options.retry, &self.retry);
        if !self.extra_libs.is_empty() {
            options.extra_libs = self.extra_libs.clone();
        }
        if self.glibc_version.is_some() {
            options.glibc_version = self.glibc_version.clone();
        }
    }
}

/// GCC build flags.
#[derive(Debug, Clone, Default, Args)]
pub struct GccFlags {
    /// The machine the builds run on
    #[arg(long)]
    pub build: Option<Triplet>,
    /// Directory holding the source components
    #[arg(long)]
    pub home: Option<PathBuf>,
    /// Directory the toolchains are installed under
    #[arg(long)]
    pub prefix_dir: Option<PathBuf>,
    /// Directory with .gdbinit, python_config.sh, linker scripts and readme/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Build gdb alongside binutils
    #[arg(long)]
    pub gdb: Option<bool>,
    /// Build gdbserver for linux targets
    #[arg(long)]
    pub gdbserver: Option<bool>,
    /// Build newlib for freestanding targets
    #[arg(long)]
    pub newlib: Option<bool>,
    /// Parallel jobs for make
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl GccFlags {
    pub fn apply(&self, options: &mut GccOptions) {
        set(&mut options.build, &self.build);
        set(&mut options.home, &self.home);
        set(&mut options.prefix_dir, &self.prefix_dir);
        set(&mut options.data_dir, &self.data_dir);
        set(&mut options.gdb, &self.gdb);
        set(&mut options.gdbserver, &self.gdbserver);
        set(&mut options.newlib, &self.newlib);
        set(&mut options.jobs, &self.jobs);
    }
}

/// LLVM build flags.
#[derive(Debug, Clone, Default, Args)]
pub struct LlvmFlags {
    /// The machine the build runs on
    #[arg(long)]
    pub build: Option<Triplet>,
    /// The machine the produced compiler runs on
    #[arg(long)]
    pub host: Option<Triplet>,
    /// Directory holding llvm, the host libraries, the sysroot and the installs
    #[arg(long)]
    pub home: Option<PathBuf>,
    /// Directory the GCC toolchains that seed the sysroot are installed under
    #[arg(long)]
    pub gcc_prefix_dir: Option<PathBuf>,
    /// Directory with readme/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Parallel jobs for ninja
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl LlvmFlags {
    pub fn apply(&self, options: &mut LlvmOptions) {
        set(&mut options.build, &self.build);
        set(&mut options.host, &self.host);
        set(&mut options.home, &self.home);
        set(&mut options.gcc_prefix_dir, &self.gcc_prefix_dir);
        set(&mut options.data_dir, &self.data_dir);
        set(&mut options.jobs, &self.jobs);
    }
}

fn set<T: Clone>(field: &mut T, flag: &Option<T>) {
    if let Some(value) = flag {
        *field = value.clone();
    }
}
