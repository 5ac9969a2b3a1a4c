//! Size-bounded, numbered rotating log file
//!
//! The active file is `path`; rotated files are `path.1` (newest) through
//! `path.N` (oldest). Before an append that would make the active file
//! reach `max_bytes`, every backup shifts up by one, the active file
//! becomes `path.1` and a fresh active file is opened.

use child_process::LineSink;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Default active file name
pub const DEFAULT_LOG_FILE: &str = "debug.log";

/// Bounds on the rotating log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotation {
    /// Size at which the active file is rotated; `0` disables rotation
    pub max_bytes: u64,
    /// Number of rotated files kept; `0` truncates the active file instead
    pub max_backups: usize,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024, // 10MB
            max_backups: 5,
        }
    }
}

/// Append-only log shared by both relays and the tracing file layer
///
/// Each append is one `write_all` under a single lock, so lines from
/// concurrent writers never interleave. Cloning shares the same file.
#[derive(Debug, Clone)]
pub struct RotatingFileSink {
    inner: Arc<Mutex<ActiveFile>>,
}

#[derive(Debug)]
struct ActiveFile {
    path: PathBuf,
    rotation: LogRotation,
    file: File,
    size: u64,
}

impl RotatingFileSink {
    /// Open (or create) the active log file for appending
    pub fn open(path: impl Into<PathBuf>, rotation: LogRotation) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(ActiveFile {
                path,
                rotation,
                file,
                size,
            })),
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.lock()
            .map(|active| active.path.clone())
            .unwrap_or_default()
    }

    /// Path of the `n`th rotated file (1 is the newest)
    pub fn backup_path(path: &Path, n: usize) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    /// Append `bytes` as one unit, rotating first if needed
    pub fn append(&self, bytes: &[u8]) -> io::Result<()> {
        self.lock()?.append(bytes)
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, ActiveFile>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

impl ActiveFile {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.should_rotate(bytes.len() as u64) {
            self.rotate()?;
        }
        self.file.write_all(bytes)?;
        self.size += bytes.len() as u64;
        Ok(())
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        // An empty file is never rotated, even for an oversized line.
        self.rotation.max_bytes > 0
            && self.size > 0
            && self.size + incoming >= self.rotation.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        if self.rotation.max_backups == 0 {
            self.file.set_len(0)?;
            self.size = 0;
            return Ok(());
        }

        // rename() replaces the destination, which drops the oldest backup.
        for n in (1..self.rotation.max_backups).rev() {
            let from = RotatingFileSink::backup_path(&self.path, n);
            if from.exists() {
                fs::rename(&from, RotatingFileSink::backup_path(&self.path, n + 1))?;
            }
        }
        fs::rename(&self.path, RotatingFileSink::backup_path(&self.path, 1))?;

        self.file = open_append(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl LineSink for RotatingFileSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.append(&buf)
    }
}

impl Write for RotatingFileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.file.flush()
    }
}
