//! Local process backend: process-group launch, relays and kill

use async_process::Child;
use async_trait::async_trait;
use futures_lite::io::AsyncRead;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::sync::Arc;
use tracing::{debug, info};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::process::{ExitStatus, ProcessHandle};
use crate::relay::{LogSource, relay};
use crate::sink::{ConsoleSink, LineSink};

/// Where a child's two output streams are relayed to
#[derive(Clone)]
pub struct RelaySinks {
    /// Console destination for the child's stdout
    pub stdout: Arc<dyn LineSink>,
    /// Console destination for the child's stderr
    pub stderr: Arc<dyn LineSink>,
    /// Durable log shared by both relays
    pub log: Arc<dyn LineSink>,
}

impl RelaySinks {
    /// Forward to the supervisor's own stdout/stderr and to `log`
    pub fn console(log: Arc<dyn LineSink>) -> Self {
        Self {
            stdout: Arc::new(ConsoleSink::stdout()),
            stderr: Arc::new(ConsoleSink::stderr()),
            log,
        }
    }
}

/// Launcher for running the child locally in its own process group
#[derive(Clone)]
pub struct LocalLauncher {
    sinks: RelaySinks,
}

impl LocalLauncher {
    /// Create a launcher relaying child output into `sinks`
    pub fn new(sinks: RelaySinks) -> Self {
        Self { sinks }
    }

    fn spawn_relay<R>(&self, reader: R, source: LogSource, console: Arc<dyn LineSink>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let log = Arc::clone(&self.sinks.log);
        // Detached: a relay ends on its own when the pipe closes.
        smol::spawn(async move {
            relay(reader, source, &*console, &*log).await;
        })
        .detach();
    }
}

#[async_trait]
impl Launcher for LocalLauncher {
    type Handle = LocalChildHandle;

    async fn launch(&self, command: &Command) -> Result<Self::Handle> {
        let mut child = command
            .prepare()
            .spawn()
            .map_err(|e| Error::from_spawn(command.to_string(), e))?;

        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            self.spawn_relay(stdout, LogSource::Stdout, Arc::clone(&self.sinks.stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            self.spawn_relay(stderr, LogSource::Stderr, Arc::clone(&self.sinks.stderr));
        }

        info!(pid, pgid = pid, %command, "Launched process");
        Ok(LocalChildHandle { child, pid })
    }
}

/// A handle to a locally launched child and its process group
pub struct LocalChildHandle {
    /// The underlying child process
    child: Child,
    /// Pid of the child, which is also its process group id
    pid: u32,
}

#[async_trait]
impl ProcessHandle for LocalChildHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn pgid(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_status()
            .map(|status| status.map(ExitStatus::from))
            .map_err(|e| Error::WaitFailed {
                pid: self.pid,
                reason: e.to_string(),
            })
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.status().await.map_err(|e| Error::WaitFailed {
            pid: self.pid,
            reason: e.to_string(),
        })?;
        Ok(ExitStatus::from(status))
    }

    fn signal_group(&self, signal: Signal) -> Result<()> {
        let pgid = self.pgid();
        debug!(pgid, %signal, "Signaling process group");

        match killpg(Pid::from_raw(pgid as i32), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(Error::NoSuchProcess { pgid }),
            Err(e) => Err(Error::SignalFailed {
                signal: signal.to_string(),
                pgid,
                reason: e.to_string(),
            }),
        }
    }
}
