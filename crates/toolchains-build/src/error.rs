//! Build error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while planning or running a toolchain build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A source component directory is missing under the source home.
    #[error("cannot find lib \"{component}\" in directory \"{}\"", path.display())]
    MissingSource { component: String, path: PathBuf },

    /// An artifact that an earlier build should have produced is missing.
    #[error("{what} not found at {}", path.display())]
    MissingArtifact { what: String, path: PathBuf },

    /// A compiler that must be resolvable on the build PATH is not.
    #[error("\"{program}\" is not on PATH, but {required_by} needs it")]
    NotOnPath { program: String, required_by: String },

    /// A toolchain combination this engine does not know how to build.
    #[error("unsupported build: {detail}")]
    Unsupported { detail: String },

    /// An option value outside its valid range.
    #[error("invalid option: {detail}")]
    InvalidOption { detail: String },

    /// A build definition file that could not be loaded.
    #[error("invalid build definition {}: {reason}", path.display())]
    Definition { path: PathBuf, reason: String },

    /// The persisted bootstrap cursor could not be read or is inconsistent.
    #[error("bootstrap state {}: {reason}", path.display())]
    BootstrapState { path: PathBuf, reason: String },

    #[error(transparent)]
    Triplet(#[from] toolchains_triplet::TripletError),

    /// External command or filesystem failure.
    #[error(transparent)]
    Shell(#[from] toolchains_shell::ShellError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
