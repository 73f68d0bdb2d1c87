//! The GCC toolchain build state machine.
//!
//! [`plan`] turns a `(build, host, target)` tuple into an ordered list of
//! [`GccStep`]s; [`runner`] executes them through a shell, threading a
//! [`BuildContext`] from one step to the next.

pub mod plan;
pub mod runner;

pub use plan::{BuildPath, GccPass, GccStep, RequiredSource, ToolchainBuildPlan};
pub use runner::GccBuilder;

use toolchains_shell::Shell;
use toolchains_triplet::ToolchainSpec;

use crate::context::BuildContext;
use crate::error::Result;
use crate::options::GccOptions;

/// Plan and build one GCC toolchain.
pub fn build<S: Shell + ?Sized>(
    shell: &S,
    spec: ToolchainSpec,
    options: &GccOptions,
    ctx: BuildContext,
) -> Result<BuildContext> {
    let plan = ToolchainBuildPlan::new(spec, options)?;
    GccBuilder::new(shell, &plan).build(ctx)
}
