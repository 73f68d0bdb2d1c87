//! The multi-stage, self-hosting LLVM build.
//!
//! A native build runs four [`Stage`]s. Stage 1 builds clang with whatever
//! compiler the build machine has, then the runtimes for every target,
//! harvesting each into the [`Sysroot`](crate::sysroot::Sysroot). Stage 2
//! rebuilds clang against those runtimes into `<name>-new`; stage 3 rebuilds
//! the runtimes with it; stage 4 swaps the installs and packages. The last
//! completed stage is persisted so an interrupted run can resume.
//!
//! A canadian build (build machine differs from host) is a single pass that
//! reuses the build machine's own LLVM.

pub mod bootstrap;
pub mod cmake;
pub mod plan;
pub mod state;

pub use bootstrap::Bootstrapper;
pub use cmake::CmakeOptions;
pub use plan::{BootstrapBuildPlan, Project, LLVM_MAJOR};
pub use state::{BootstrapState, StartAt, Stage};

use toolchains_shell::Shell;

use crate::context::BuildContext;
use crate::error::Result;
use crate::options::LlvmOptions;

/// Plan and build one LLVM toolchain.
pub fn build<S: Shell + ?Sized>(
    shell: &S,
    options: &LlvmOptions,
    start: StartAt,
    ctx: BuildContext,
) -> Result<BuildContext> {
    let plan = BootstrapBuildPlan::new(options)?;
    Bootstrapper::new(shell, &plan).build(ctx, start)
}
