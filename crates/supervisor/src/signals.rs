//! Routing of OS signals into supervisor controls
//!
//! Signal handlers never touch supervisor state. A dedicated thread turns
//! each delivered signal into a [`Control`] message; the supervision loop
//! is the only consumer, so every transition is serialized there.

use async_channel::Sender;
use signal_hook::consts::{SIGTERM, SIGUSR1};
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::os::raw::c_int;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// An operator request for the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Kill the current child and launch a fresh one
    Reload,
    /// Kill the current child and exit with status 0
    Terminate,
}

/// Forwards SIGUSR1 and SIGTERM to the supervision loop
pub struct SignalRouter {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalRouter {
    /// Signals the router intercepts; everything else keeps its default
    pub const SIGNALS: [c_int; 2] = [SIGUSR1, SIGTERM];

    /// Map a signal number to the control it requests
    pub fn map(signal: c_int) -> Option<Control> {
        match signal {
            SIGUSR1 => Some(Control::Reload),
            SIGTERM => Some(Control::Terminate),
            _ => None,
        }
    }

    /// Register handlers and start forwarding into `sender`
    pub fn install(sender: Sender<Control>) -> io::Result<Self> {
        let mut signals = Signals::new(Self::SIGNALS)?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signal-router".into())
            .spawn(move || {
                for signal in signals.forever() {
                    let Some(control) = Self::map(signal) else {
                        continue;
                    };
                    info!(signal, ?control, "Received signal");
                    if sender.send_blocking(control).is_err() {
                        debug!("Supervisor stopped listening, signal router exiting");
                        break;
                    }
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Stop forwarding and join the router thread
    pub fn close(mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
