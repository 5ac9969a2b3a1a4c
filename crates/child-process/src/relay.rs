//! Line-oriented relay of a child's output pipe
//!
//! Each child generation gets two relays, one per pipe. A relay reads its
//! pipe until end-of-stream and writes every line, in order, first to the
//! console sink and then to the shared log sink. It has no cancellation:
//! it ends when the child (and every descendant holding the pipe) is gone.

use crate::sink::LineSink;
use futures::stream::{self, Stream, StreamExt};
use futures_lite::io::{AsyncBufReadExt, AsyncRead, BufReader};
use std::fmt;
use tracing::{debug, warn};

/// Which of the child's pipes a relay reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One decoded line of child output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayLine {
    /// The line without its terminator
    pub text: String,
    /// Whether malformed UTF-8 was replaced with U+FFFD
    pub lossy: bool,
}

impl RelayLine {
    /// Decode raw bytes read up to and including an optional `\n`
    pub fn decode(raw: &[u8]) -> Self {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(text) => Self {
                text: text.to_owned(),
                lossy: false,
            },
            Err(_) => Self {
                text: String::from_utf8_lossy(raw).into_owned(),
                lossy: true,
            },
        }
    }
}

/// Counters reported by a finished relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Lines relayed
    pub lines: usize,
    /// Lines that needed replacement characters
    pub lossy_lines: usize,
}

/// Lazily read `reader` as a finite stream of lines
///
/// A trailing fragment without a newline is still emitted at end-of-stream.
/// A read error ends the stream.
pub fn lines<R>(reader: R) -> impl Stream<Item = RelayLine>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(BufReader::new(reader)), |state| async move {
        let mut reader = state?;
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((RelayLine::decode(&buf), Some(reader))),
            Err(e) => {
                debug!(error = %e, "Read error on child pipe, ending relay");
                if buf.is_empty() {
                    None
                } else {
                    Some((RelayLine::decode(&buf), None))
                }
            }
        }
    })
}

/// Copy every line of `reader` to `console` and then to `log`
///
/// Sink failures are logged and skipped; they never end the relay.
pub async fn relay<R>(
    reader: R,
    source: LogSource,
    console: &dyn LineSink,
    log: &dyn LineSink,
) -> RelayStats
where
    R: AsyncRead + Unpin,
{
    let mut stats = RelayStats::default();
    let mut lines = std::pin::pin!(lines(reader));

    while let Some(line) = lines.next().await {
        if line.lossy {
            stats.lossy_lines += 1;
            debug!(%source, "Replaced malformed UTF-8 in child output");
        }
        if let Err(e) = console.write_line(&line.text) {
            warn!(%source, error = %e, "Failed to forward child output");
        }
        if let Err(e) = log.write_line(&line.text) {
            warn!(%source, error = %e, "Failed to write child output to log");
        }
        stats.lines += 1;
    }

    debug!(%source, lines = stats.lines, lossy = stats.lossy_lines, "Relay reached end of stream");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use futures_lite::io::Cursor;
    use std::io;

    #[test]
    fn test_decode_strips_terminators() {
        assert_eq!(RelayLine::decode(b"plain\n").text, "plain");
        assert_eq!(RelayLine::decode(b"crlf\r\n").text, "crlf");
        assert_eq!(RelayLine::decode(b"partial").text, "partial");
        assert_eq!(RelayLine::decode(b"  keep spaces  \n").text, "  keep spaces  ");
    }

    #[test]
    fn test_decode_replaces_malformed_utf8() {
        let line = RelayLine::decode(b"ok \xff\xfe end\n");
        assert!(line.lossy);
        assert_eq!(line.text, "ok \u{FFFD}\u{FFFD} end");
    }

    #[smol_potat::test]
    async fn test_lines_emits_trailing_fragment() {
        let collected: Vec<_> = lines(Cursor::new(b"A\nB\nC".to_vec()))
            .map(|l| l.text)
            .collect()
            .await;
        assert_eq!(collected, vec!["A", "B", "C"]);
    }

    #[smol_potat::test]
    async fn test_lines_keeps_empty_lines() {
        let collected: Vec<_> = lines(Cursor::new(b"\n\nx\n".to_vec()))
            .map(|l| l.text)
            .collect()
            .await;
        assert_eq!(collected, vec!["", "", "x"]);
    }

    #[smol_potat::test]
    async fn test_relay_writes_console_then_log_in_order() {
        let console = MemorySink::new();
        let log = MemorySink::new();

        let stats = relay(
            Cursor::new(b"A\nB\n\xc3(\nC\n".to_vec()),
            LogSource::Stdout,
            &console,
            &log,
        )
        .await;

        let expected = vec!["A", "B", "\u{FFFD}(", "C"];
        assert_eq!(console.lines(), expected);
        assert_eq!(log.lines(), expected);
        assert_eq!(
            stats,
            RelayStats {
                lines: 4,
                lossy_lines: 1
            }
        );
    }

    struct BrokenSink;

    impl LineSink for BrokenSink {
        fn write_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[smol_potat::test]
    async fn test_relay_survives_failing_console() {
        let log = MemorySink::new();
        let stats = relay(
            Cursor::new(b"one\ntwo\n".to_vec()),
            LogSource::Stderr,
            &BrokenSink,
            &log,
        )
        .await;

        assert_eq!(stats.lines, 2);
        assert_eq!(log.lines(), vec!["one", "two"]);
    }
}
