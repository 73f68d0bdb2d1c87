//! Toolchain specifications: the `(build, host, target)` tuple and its category.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TripletError};
use crate::triplet::Triplet;

/// How a toolchain relates the machine it is built on, runs on, and emits code for.
///
/// The declaration order is the scheduling precedence: every native toolchain
/// is built before any cross toolchain, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// build = host = target
    Native,
    /// build = host ≠ target
    Cross,
    /// build ≠ host = target
    Canadian,
    /// Any other combination.
    CanadianCross,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Native,
        Category::Cross,
        Category::Canadian,
        Category::CanadianCross,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Native => "native",
            Category::Cross => "cross",
            Category::Canadian => "canadian",
            Category::CanadianCross => "canadian-cross",
        })
    }
}

/// Classify a `(build, host, target)` tuple.
///
/// Total over all inputs. `build = target ≠ host` has no dedicated name and
/// falls into [`Category::CanadianCross`], since it still needs a toolchain
/// for the foreign host before it can be built.
pub fn classify(build: &Triplet, host: &Triplet, target: &Triplet) -> Category {
    if build == host && host == target {
        Category::Native
    } else if build == host {
        Category::Cross
    } else if host == target {
        Category::Canadian
    } else {
        Category::CanadianCross
    }
}

/// Operating environment class of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetEnv {
    Linux,
    WindowsMingw,
    Freestanding,
}

impl TargetEnv {
    /// Determine the environment class of a triplet.
    pub fn of(triplet: &Triplet) -> Result<Self> {
        if triplet.is_freestanding() {
            Ok(TargetEnv::Freestanding)
        } else if triplet.is_mingw() {
            Ok(TargetEnv::WindowsMingw)
        } else if triplet.is_linux() {
            Ok(TargetEnv::Linux)
        } else {
            Err(TripletError::UnknownEnvironment {
                triplet: triplet.to_string(),
            })
        }
    }
}

impl fmt::Display for TargetEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetEnv::Linux => "linux",
            TargetEnv::WindowsMingw => "windows-mingw",
            TargetEnv::Freestanding => "freestanding",
        })
    }
}

/// An immutable `(build, host, target)` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainSpec {
    pub build: Triplet,
    pub host: Triplet,
    pub target: Triplet,
}

impl ToolchainSpec {
    pub fn new(build: Triplet, host: Triplet, target: Triplet) -> Self {
        Self { build, host, target }
    }

    /// A native toolchain: all three machines are `triplet`.
    pub fn native(triplet: Triplet) -> Self {
        Self::new(triplet.clone(), triplet.clone(), triplet)
    }

    /// A cross toolchain built and run on `build`.
    pub fn cross(build: Triplet, target: Triplet) -> Self {
        Self::new(build.clone(), build, target)
    }

    pub fn category(&self) -> Category {
        classify(&self.build, &self.host, &self.target)
    }

    /// True when the produced compiler emits code for another machine.
    pub fn is_cross_compiler(&self) -> bool {
        self.host != self.target
    }

    pub fn is_freestanding(&self) -> bool {
        self.target.is_freestanding()
    }

    pub fn target_env(&self) -> Result<TargetEnv> {
        TargetEnv::of(&self.target)
    }

    pub fn host_env(&self) -> Result<TargetEnv> {
        TargetEnv::of(&self.host)
    }
}

impl fmt::Display for ToolchainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "build={} host={} target={}",
            self.build, self.host, self.target
        )
    }
}
