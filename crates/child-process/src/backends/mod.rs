//! Backend implementations for launching the supervised child
//!
//! Users can plug in their own backend by implementing the
//! [`Launcher`](crate::launcher::Launcher) and
//! [`ProcessHandle`](crate::process::ProcessHandle) traits.

pub mod local;
pub use local::{LocalChildHandle, LocalLauncher, RelaySinks};
