//! Launcher trait for starting supervised children

use crate::command::Command;
use crate::error::Result;
use crate::process::ProcessHandle;
use async_trait::async_trait;

/// Something that can start a command as a supervised child
///
/// Launching is expected to also start forwarding the child's output, so
/// the returned handle is only used for liveness and the kill protocol.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    /// The process handle type this launcher produces
    type Handle: ProcessHandle;

    /// Start `command`, returning a handle to the running child
    ///
    /// An error here means the command could not be spawned at all.
    async fn launch(&self, command: &Command) -> Result<Self::Handle>;
}
