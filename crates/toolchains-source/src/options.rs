//! Options controlling source acquisition.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::REQUIRED_ARCHIVES;
use crate::error::{Result, SourceError};
use crate::mirror::Mirror;

/// How much history a git clone fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneStrategy {
    /// Full history, blobs fetched on demand (`--filter=blob:none`).
    #[default]
    Partial,
    /// Truncated history (`--depth=N`).
    Shallow,
    Full,
}

impl fmt::Display for CloneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloneStrategy::Partial => "partial",
            CloneStrategy::Shallow => "shallow",
            CloneStrategy::Full => "full",
        })
    }
}

impl FromStr for CloneStrategy {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "partial" => Ok(CloneStrategy::Partial),
            "shallow" => Ok(CloneStrategy::Shallow),
            "full" => Ok(CloneStrategy::Full),
            _ => Err(SourceError::InvalidOption {
                detail: format!("unknown clone type \"{s}\""),
            }),
        }
    }
}

/// Everything the acquisition engine needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireOptions {
    /// Directory holding one subdirectory per component.
    pub home: PathBuf,
    pub clone: CloneStrategy,
    /// History depth for shallow clones.
    pub depth: u32,
    /// Use ssh URLs for github-hosted repositories.
    pub ssh: bool,
    pub remote: Mirror,
    /// Retries after the first failed network attempt.
    pub retry: u32,
    /// Optional archive components to fetch in addition to the required ones.
    pub extra_libs: Vec<String>,
    /// glibc release branch to clone. Detected from the host when unset.
    pub glibc_version: Option<String>,
}

/// `$HOME`, or the current directory when it is unset.
pub fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            home: default_home(),
            clone: CloneStrategy::Partial,
            depth: 1,
            ssh: false,
            remote: Mirror::Github,
            retry: 5,
            extra_libs: Vec::new(),
            glibc_version: None,
        }
    }
}

impl AcquireOptions {
    /// Total attempts for each network operation.
    pub fn attempts(&self) -> usize {
        self.retry as usize + 1
    }

    /// `git clone` arguments selecting the history strategy.
    pub fn clone_args(&self) -> Vec<String> {
        match self.clone {
            CloneStrategy::Partial => vec!["--filter=blob:none".to_string()],
            CloneStrategy::Shallow => vec![format!("--depth={}", self.depth)],
            CloneStrategy::Full => Vec::new(),
        }
    }

    /// Required archives followed by requested extras, without duplicates.
    pub fn archive_names(&self) -> Vec<String> {
        let mut names: Vec<String> = REQUIRED_ARCHIVES.iter().map(|s| s.to_string()).collect();
        for extra in &self.extra_libs {
            if !names.contains(extra) {
                names.push(extra.clone());
            }
        }
        names
    }

    /// Check option values before any network operation starts.
    pub fn validate(&self) -> Result<()> {
        if !self.home.is_dir() {
            return Err(SourceError::InvalidOption {
                detail: format!("home directory {} does not exist", self.home.display()),
            });
        }
        if self.clone == CloneStrategy::Shallow && self.depth == 0 {
            return Err(SourceError::InvalidOption {
                detail: "shallow clone depth must be positive".into(),
            });
        }
        Ok(())
    }
}
