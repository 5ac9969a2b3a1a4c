//! Command-line configuration

use crate::error::{Result, SupervisorError};
use crate::log_sink::{DEFAULT_LOG_FILE, LogRotation};
use child_process::Command;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Run one child process, restart it when it exits or on SIGUSR1, stop it on SIGTERM
#[derive(Parser, Debug)]
#[command(name = "supervisor")]
#[command(version)]
pub struct Cli {
    /// Run this script through `sh -c` instead of an argument vector
    #[arg(long, conflicts_with = "command")]
    pub shell: Option<String>,

    /// Rotating log file receiving child output and lifecycle events
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Size in bytes at which the log file is rotated
    #[arg(long, default_value_t = LogRotation::default().max_bytes)]
    pub log_max_bytes: u64,

    /// Number of rotated log files to keep
    #[arg(long, default_value_t = LogRotation::default().max_backups)]
    pub log_backups: usize,

    /// How often to check whether the child is still running
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Program and arguments to supervise
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

/// Everything the supervisor needs, fixed for its whole lifetime
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// The child command, launched unchanged on every restart
    pub command: Command,
    /// Active log file path
    pub log_file: PathBuf,
    /// Log rotation bounds
    pub rotation: LogRotation,
    /// Polling cadence of the supervision loop
    pub poll_interval: Duration,
    /// Debug-level logging
    pub verbose: bool,
}

impl Cli {
    /// Validate the parsed arguments into a configuration
    pub fn into_config(self) -> Result<SupervisorConfig> {
        let command = match self.shell {
            Some(script) if script.trim().is_empty() => {
                return Err(SupervisorError::Config("--shell script is empty".into()));
            }
            Some(script) => Command::shell(script),
            None => Command::from_argv(self.command).ok_or_else(|| {
                SupervisorError::Config("no command given to supervise".into())
            })?,
        };

        if self.poll_interval_ms == 0 {
            return Err(SupervisorError::Config(
                "--poll-interval-ms must be greater than zero".into(),
            ));
        }

        Ok(SupervisorConfig {
            command,
            log_file: self.log_file,
            rotation: LogRotation {
                max_bytes: self.log_max_bytes,
                max_backups: self.log_backups,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            verbose: self.verbose,
        })
    }
}
