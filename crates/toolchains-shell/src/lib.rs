//! External command execution for the toolchain orchestrator.
//!
//! Every process spawn and filesystem mutation performed by the other crates
//! goes through the [`Shell`] trait. That makes dry-run a property of the
//! shell rather than of each caller, and lets tests substitute
//! [`RecordingShell`].

pub mod command;
pub mod error;
pub mod fs;
pub mod recording;
pub mod resources;
pub mod shell;

pub use command::CommandLine;
pub use error::{Result, ShellError};
pub use fs::FsOp;
pub use recording::{Event, RecordingShell};
pub use resources::{available_memory_mib, default_jobs, xz_memlimit};
pub use shell::{Captured, RunOptions, Shell, SystemShell};
