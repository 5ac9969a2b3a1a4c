//! Process handle trait, exit status and the kill protocol

use crate::error::{Error, Result};
use async_trait::async_trait;
use nix::sys::signal::Signal;
use std::fmt;
use tracing::{debug, info, warn};

/// A handle to one running child and its process group
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// Get the process ID of the direct child
    fn pid(&self) -> u32;

    /// Get the process group ID (equal to the pid at launch)
    fn pgid(&self) -> u32;

    /// Poll for exit without blocking
    ///
    /// Returns `Ok(None)` while the child is still running.
    fn try_wait(&mut self) -> Result<Option<ExitStatus>>;

    /// Wait for the direct child to exit, reaping it
    async fn wait(&mut self) -> Result<ExitStatus>;

    /// Deliver `signal` to every process in the child's group
    fn signal_group(&self, signal: Signal) -> Result<()>;

    /// Ask the whole process group to stop, then reap the direct child
    ///
    /// Descendants are only signaled, never waited for. A group that is
    /// already gone, or a failed wait, counts as "already dead": the error
    /// is logged and the handle is considered reaped.
    async fn stop(&mut self) -> Option<ExitStatus> {
        let (pid, pgid) = (self.pid(), self.pgid());
        info!(pid, pgid, "Killing process group");

        match self.signal_group(Signal::SIGTERM) {
            Ok(()) => {}
            Err(Error::NoSuchProcess { .. }) => {
                debug!(pgid, "Process group already gone");
            }
            Err(e) => warn!(pgid, error = %e, "Failed to signal process group"),
        }

        match self.wait().await {
            Ok(status) => {
                info!(pid, %status, "Process killed");
                Some(status)
            }
            Err(e) => {
                warn!(pid, error = %e, "Failed to reap killed process, assuming it is gone");
                None
            }
        }
    }
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Returns true if the process was terminated by a signal
    pub fn terminated_by_signal(&self) -> bool {
        self.signal.is_some()
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "code {code}"),
            (None, Some(signal)) => match Signal::try_from(signal) {
                Ok(sig) => write!(f, "signal {sig}"),
                Err(_) => write!(f, "signal {signal}"),
            },
            (None, None) => f.write_str("unknown status"),
        }
    }
}
