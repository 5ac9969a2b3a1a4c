//! Single-owner record of whether a child exists

use chrono::{DateTime, Utc};
use child_process::ProcessHandle;

/// A child the supervisor currently owns
#[derive(Debug)]
pub struct RunningChild<H> {
    /// Handle to the child and its process group
    pub handle: H,
    /// When the child was launched
    pub since: DateTime<Utc>,
    /// Launch sequence number, starting at 1
    pub generation: u64,
}

impl<H> RunningChild<H> {
    /// Time the child has been running, in whole milliseconds
    pub fn uptime_ms(&self) -> i64 {
        (Utc::now() - self.since).num_milliseconds()
    }
}

/// Either no child, or exactly one running child
///
/// Transitions only alternate: `NoChild -> Running -> NoChild -> ...`.
#[derive(Debug)]
pub enum SupervisorState<H> {
    /// No child is owned; the next tick launches one
    NoChild,
    /// One child is owned
    Running(RunningChild<H>),
}

impl<H> Default for SupervisorState<H> {
    fn default() -> Self {
        Self::NoChild
    }
}

impl<H: ProcessHandle> SupervisorState<H> {
    /// Whether a child is owned
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Pid of the owned child, if any
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Running(child) => Some(child.handle.pid()),
            Self::NoChild => None,
        }
    }

    /// Mutable access to the owned child
    pub fn child_mut(&mut self) -> Option<&mut RunningChild<H>> {
        match self {
            Self::Running(child) => Some(child),
            Self::NoChild => None,
        }
    }

    /// Move from `NoChild` to `Running`
    ///
    /// Hands the handle back if a child is already owned, so a second
    /// child is never silently dropped or stacked.
    pub fn install(&mut self, handle: H, generation: u64) -> Result<(), H> {
        if self.is_running() {
            return Err(handle);
        }
        *self = Self::Running(RunningChild {
            handle,
            since: Utc::now(),
            generation,
        });
        Ok(())
    }

    /// Move to `NoChild`, yielding the previously owned child
    pub fn take(&mut self) -> Option<RunningChild<H>> {
        match std::mem::take(self) {
            Self::Running(child) => Some(child),
            Self::NoChild => None,
        }
    }
}
