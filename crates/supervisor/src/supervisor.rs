//! The supervision loop and the transitions it serializes
//!
//! [`Supervisor::run`] is the only place state changes: it multiplexes the
//! polling tick with [`Control`] messages from the signal router, so a
//! reload, a terminate and an observed exit can never race each other.

use crate::error::{Result, SupervisorError};
use crate::signals::Control;
use crate::state::SupervisorState;
use async_channel::Receiver;
use child_process::{Command, ExitStatus, Launcher, ProcessHandle};
use futures::StreamExt;
use futures_lite::future;
use smol::Timer;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default polling cadence of the supervision loop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Children launched
    pub launches: u64,
    /// Kill protocols run (reload or terminate with a live child)
    pub kills: u64,
    /// Exits observed by polling
    pub exits: u64,
}

/// Result of one non-blocking liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// There was no child to poll
    NoChild,
    /// The child is still running, or its status could not be checked
    Running,
    /// The child exited and was reaped
    Exited(ExitStatus),
}

enum Wake {
    Tick,
    Control(Control),
}

/// Owns the single child and drives it through its lifecycle
pub struct Supervisor<L: Launcher> {
    command: Command,
    launcher: L,
    state: SupervisorState<L::Handle>,
    poll_interval: Duration,
    stats: SupervisorStats,
}

impl<L: Launcher> Supervisor<L> {
    /// Create a supervisor in the `NoChild` state
    pub fn new(command: Command, launcher: L, poll_interval: Duration) -> Self {
        Self {
            command,
            launcher,
            state: SupervisorState::NoChild,
            poll_interval,
            stats: SupervisorStats::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> &SupervisorState<L::Handle> {
        &self.state
    }

    /// Lifecycle counters so far
    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    /// The launcher children are started with
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// `NoChild -> Running`: start the command
    ///
    /// A spawn failure is returned as [`SupervisorError::Launch`] and is
    /// fatal; it is never retried.
    pub async fn launch(&mut self) -> Result<()> {
        if let Some(pid) = self.state.pid() {
            return Err(SupervisorError::AlreadyRunning { pid });
        }

        let handle = self
            .launcher
            .launch(&self.command)
            .await
            .map_err(SupervisorError::Launch)?;

        self.stats.launches += 1;
        let generation = self.stats.launches;
        let pid = handle.pid();

        if let Err(mut rejected) = self.state.install(handle, generation) {
            rejected.stop().await;
            return Err(SupervisorError::AlreadyRunning { pid });
        }

        debug!(pid, generation, "Child installed");
        Ok(())
    }

    /// Check the child without blocking; on exit, reap it and clear the state
    ///
    /// A failed check leaves the child in place; the next tick checks again.
    pub async fn poll(&mut self) -> PollOutcome {
        let Some(child) = self.state.child_mut() else {
            return PollOutcome::NoChild;
        };
        let pid = child.handle.pid();

        let observed = match child.handle.try_wait() {
            Ok(None) => return PollOutcome::Running,
            Ok(Some(status)) => status,
            Err(e) => {
                warn!(pid, error = %e, "Failed to poll child, retrying next tick");
                return PollOutcome::Running;
            }
        };

        let Some(mut child) = self.state.take() else {
            return PollOutcome::NoChild;
        };

        // Final reap; the child has exited, so this returns the cached status.
        let status = match child.handle.wait().await {
            Ok(status) => status,
            Err(e) => {
                warn!(pid, error = %e, "Failed to reap exited child");
                observed
            }
        };

        self.stats.exits += 1;
        info!(
            pid,
            generation = child.generation,
            uptime_ms = child.uptime_ms(),
            "Process exited with {status}"
        );

        PollOutcome::Exited(status)
    }

    /// Run the kill protocol on the current child, if there is one
    ///
    /// Afterwards the state is always `NoChild` and the child is reaped.
    pub async fn kill(&mut self) -> Option<ExitStatus> {
        let mut child = self.state.take()?;
        self.stats.kills += 1;

        let status = child.handle.stop().await;
        debug!(
            generation = child.generation,
            uptime_ms = child.uptime_ms(),
            "Child generation ended"
        );
        status
    }

    /// Reload: kill the current child (if any) and launch a fresh one
    pub async fn reload(&mut self) -> Result<()> {
        info!("Reloading...");
        if !self.state.is_running() {
            debug!("No child to kill, launching directly");
        }
        self.kill().await;
        self.launch().await
    }

    /// Terminate: kill the current child (if any)
    ///
    /// The caller exits with status 0 afterwards, whatever the child's own
    /// exit status was.
    pub async fn terminate(&mut self) {
        info!("Terminating...");
        self.kill().await;
    }

    /// One loop iteration: launch when idle, otherwise poll for exit
    pub async fn tick(&mut self) -> Result<()> {
        if self.state.is_running() {
            self.poll().await;
            Ok(())
        } else {
            self.launch().await
        }
    }

    /// Supervise until a [`Control::Terminate`] arrives
    ///
    /// A closed control channel is treated as terminate. Returns the final
    /// counters, or the launch error that stopped supervision.
    pub async fn run(mut self, controls: Receiver<Control>) -> Result<SupervisorStats> {
        info!(
            command = %self.command,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Supervisor started"
        );

        self.tick().await?;
        let mut ticker = Timer::interval(self.poll_interval);

        loop {
            let wake = future::or(
                async {
                    match controls.recv().await {
                        Ok(control) => Wake::Control(control),
                        Err(_) => {
                            debug!("Control channel closed");
                            Wake::Control(Control::Terminate)
                        }
                    }
                },
                async {
                    ticker.next().await;
                    Wake::Tick
                },
            )
            .await;

            match wake {
                Wake::Tick => self.tick().await?,
                Wake::Control(Control::Reload) => self.reload().await?,
                Wake::Control(Control::Terminate) => {
                    self.terminate().await;
                    info!(
                        launches = self.stats.launches,
                        exits = self.stats.exits,
                        kills = self.stats.kills,
                        "Supervisor stopped"
                    );
                    return Ok(self.stats);
                }
            }
        }
    }
}
