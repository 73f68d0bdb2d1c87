//! Source acquisition error types.

use std::path::PathBuf;

/// Errors that can occur while acquiring or updating sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A network operation failed on every allowed attempt.
    #[error("{operation} {component} failed after {attempts} attempt(s): {last_error}")]
    NetworkExhausted {
        component: String,
        operation: &'static str,
        attempts: usize,
        last_error: String,
    },

    /// A component that must already be present is missing.
    #[error("cannot find lib \"{component}\" in directory \"{}\"", path.display())]
    MissingComponent { component: String, path: PathBuf },

    /// A component name that the catalog does not know.
    #[error("unknown source component: {name}")]
    UnknownComponent { name: String },

    /// An option value outside its valid range.
    #[error("invalid option: {detail}")]
    InvalidOption { detail: String },

    /// External command or filesystem failure.
    #[error(transparent)]
    Shell(#[from] toolchains_shell::ShellError),

    /// I/O error reading component state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
