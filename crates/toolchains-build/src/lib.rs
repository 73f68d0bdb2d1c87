//! Building the toolchains: scheduling, the GCC state machine, and the LLVM
//! bootstrap.
//!
//! - [`definition`] and [`scheduler`] decide which toolchains exist and the
//!   order they must be built in.
//! - [`gcc`] plans and runs one GCC toolchain build.
//! - [`llvm`] runs the resumable multi-stage LLVM build.
//! - [`sysroot`] assembles the shared sysroot the LLVM builds compile against.
//!
//! Steps never touch the process environment; they thread a
//! [`BuildContext`] and do all their work through a
//! [`Shell`](toolchains_shell::Shell).

pub mod context;
pub mod definition;
pub mod error;
pub mod gcc;
pub mod layout;
pub mod llvm;
pub mod options;
pub mod package;
pub mod quirk;
pub mod scheduler;
pub mod sysroot;

pub use context::BuildContext;
pub use definition::{BuildDefinition, DEFINITION_SUFFIX};
pub use error::{BuildError, Result};
pub use gcc::{BuildPath, GccBuilder, GccStep, ToolchainBuildPlan};
pub use layout::{GccLayout, GCC_MAJOR};
pub use llvm::{BootstrapBuildPlan, BootstrapState, Bootstrapper, StartAt, Stage};
pub use options::{GccOptions, LlvmOptions};
pub use quirk::{ConfigureSet, TargetQuirk};
pub use scheduler::{Schedule, ScheduleInfo};
pub use sysroot::{assemble_gcc_sysroot, Sysroot};
