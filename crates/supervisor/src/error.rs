//! Error types for the supervisor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the supervisor
///
/// A child exiting, however it exits, is never one of these.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The child command could not be spawned at all
    #[error("failed to launch child: {0}")]
    Launch(#[source] child_process::Error),

    /// A launch was attempted while a child is still owned
    #[error("child {pid} is still running; refusing to launch a second one")]
    AlreadyRunning {
        /// Pid of the child that is still owned
        pid: u32,
    },

    /// The command line did not describe a usable configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The rotating log file could not be opened
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// Path of the log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Signal handlers could not be installed
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// The tracing subscriber could not be installed
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SupervisorError>;
