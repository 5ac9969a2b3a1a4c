//! Launch, relay and kill a supervised child process
//!
//! This crate owns the contract with the one child a supervisor runs: it
//! starts the command as the leader of a new process group, relays the
//! child's stdout and stderr line by line, and stops the whole group with
//! SIGTERM before reaping the direct child.

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod launcher;
pub mod process;
pub mod relay;
pub mod sink;

pub use backends::{LocalChildHandle, LocalLauncher, RelaySinks};
pub use command::Command;
pub use error::{Error, Result};
pub use launcher::Launcher;
pub use process::{ExitStatus, ProcessHandle};
pub use relay::{LogSource, RelayLine, RelayStats};
pub use sink::{ConsoleSink, LineSink, MemorySink};
