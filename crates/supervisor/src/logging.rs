//! Tracing setup: lifecycle events go to stdout and to the rotating log

use crate::error::{Result, SupervisorError};
use crate::log_sink::RotatingFileSink;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt;

/// Lines queued for the file worker before writers wait for it
const FILE_BUFFER_LINES: usize = 128_000;

/// Background writer into the rotating log
///
/// Writers block while the queue is full; events are never dropped.
fn file_writer(log: RotatingFileSink, buffered_lines: usize) -> (NonBlocking, WorkerGuard) {
    NonBlockingBuilder::default()
        .lossy(false)
        .buffered_lines_limit(buffered_lines)
        .thread_name("supervisor-log")
        .finish(log)
}

/// Install the global subscriber
///
/// The returned guard flushes queued file output when dropped, so the
/// caller keeps it alive until the process exits.
pub fn init(log: RotatingFileSink, verbose: bool) -> Result<WorkerGuard> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let (file_out, guard) = file_writer(log, FILE_BUFFER_LINES);

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout)
        .with_filter(level);
    let file = fmt::layer()
        .with_target(false)
        .with_ansi(false) // No ANSI colors in log file
        .with_writer(file_out)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| SupervisorError::Logging(e.to_string()))?;

    Ok(guard)
}
