//! CLI command implementations.

pub mod gcc;
pub mod llvm;
pub mod schedule;
pub mod source;
