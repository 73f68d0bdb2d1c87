//! Error types for command execution.

use std::path::PathBuf;

/// Errors raised while running external commands or touching the filesystem.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The command ran and exited unsuccessfully.
    #[error("command \"{command}\" failed with {}", describe_status(*status))]
    CommandFailed {
        /// The echoed command line.
        command: String,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
    },

    /// The command could not be started at all.
    #[error("cannot run \"{command}\": {source}")]
    Spawn {
        /// The echoed command line.
        command: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("{operation} failed on {}: {source}", path.display())]
    Fs {
        /// Shell-like description of the operation.
        operation: String,
        /// The path the operation was acting on.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// Result type for shell operations.
pub type Result<T> = std::result::Result<T, ShellError>;
