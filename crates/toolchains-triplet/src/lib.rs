//! Platform triplets and toolchain classification.
//!
//! A toolchain is identified by three machines:
//! - **build:** where the compiler is compiled
//! - **host:** where the produced compiler runs
//! - **target:** what the produced compiler emits code for
//!
//! Everything here is pure: no I/O, no process state.

pub mod error;
pub mod spec;
pub mod support;
pub mod triplet;

pub use error::{Result, TripletError};
pub use spec::{classify, Category, TargetEnv, ToolchainSpec};
pub use support::{check_supported, supported_hosts, supported_targets, HOSTS, TARGETS};
pub use triplet::Triplet;
