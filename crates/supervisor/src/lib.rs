//! Minimal single-child process supervisor
//!
//! Launches one command as the leader of its own process group, relays its
//! output to the console and a rotating log file, restarts it whenever it
//! exits, kills and relaunches it on SIGUSR1, and kills it and exits on
//! SIGTERM.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod log_sink;
pub mod logging;
pub mod signals;
pub mod state;
pub mod supervisor;

pub use config::{Cli, SupervisorConfig};
pub use error::{Result, SupervisorError};
pub use log_sink::{LogRotation, RotatingFileSink};
pub use signals::{Control, SignalRouter};
pub use state::{RunningChild, SupervisorState};
pub use supervisor::{PollOutcome, Supervisor, SupervisorStats};
