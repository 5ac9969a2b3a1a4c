//! Line sinks that relayed output is written to

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A destination for whole lines of child output
///
/// Implementations must accept concurrent writers and never interleave
/// partial lines.
pub trait LineSink: Send + Sync {
    /// Append one line; the implementation adds the terminator
    fn write_line(&self, line: &str) -> io::Result<()>;
}

impl<S: LineSink + ?Sized> LineSink for Arc<S> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }
}

/// The supervisor's own standard output or standard error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSink {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl ConsoleSink {
    /// Sink writing to the supervisor's stdout
    pub fn stdout() -> Self {
        Self::Stdout
    }

    /// Sink writing to the supervisor's stderr
    pub fn stderr() -> Self {
        Self::Stderr
    }
}

impl LineSink for ConsoleSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        // The std handles are internally locked; holding the lock for the
        // whole line keeps it contiguous.
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()
            }
            Self::Stderr => writeln!(io::stderr().lock(), "{line}"),
        }
    }
}

/// An in-memory sink that records every line it receives
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Number of recorded lines equal to `line`
    pub fn count(&self, line: &str) -> usize {
        self.lines
            .lock()
            .map(|lines| lines.iter().filter(|l| *l == line).count())
            .unwrap_or(0)
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::other("memory sink poisoned"))?
            .push(line.to_owned());
        Ok(())
    }
}
