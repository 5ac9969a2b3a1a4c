//! Error types for launching and controlling a child process

use thiserror::Error;

/// Unified error type for child process operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to spawn the child process
    #[error("failed to spawn `{command}`: {reason}")]
    SpawnFailed {
        /// The command line that could not be spawned
        command: String,
        /// The reason for the spawn failure
        reason: String,
    },

    /// The program could not be found
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found
        command: String,
    },

    /// The program exists but may not be executed
    #[error("permission denied executing `{command}`")]
    PermissionDenied {
        /// The command that was refused
        command: String,
    },

    /// Failed to send a signal to the child's process group
    #[error("failed to send {signal} to process group {pgid}: {reason}")]
    SignalFailed {
        /// The signal that could not be delivered
        signal: String,
        /// The target process group
        pgid: u32,
        /// The reason for the signal failure
        reason: String,
    },

    /// The process group no longer exists
    #[error("process group {pgid} no longer exists")]
    NoSuchProcess {
        /// The process group that was gone
        pgid: u32,
    },

    /// Waiting on the child failed
    #[error("failed to wait for process {pid}: {reason}")]
    WaitFailed {
        /// The process that could not be reaped
        pid: u32,
        /// The reason for the wait failure
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Nix error (Unix signal handling)
    #[error(transparent)]
    Nix(#[from] nix::Error),
}

impl Error {
    /// Classify a spawn failure for `command` by its I/O error kind
    pub fn from_spawn(command: impl Into<String>, err: std::io::Error) -> Self {
        let command = command.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::CommandNotFound { command },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { command },
            _ => Self::SpawnFailed {
                command,
                reason: err.to_string(),
            },
        }
    }

    /// Whether this error came from launching the child
    pub fn is_launch_error(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed { .. } | Self::CommandNotFound { .. } | Self::PermissionDenied { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
