// logdyn-viewer - app/replay.rs
//
// Replays a captured channel session through a transport: one inbound
// message per line, exactly as it arrived on the socket. Used by the native
// host in place of a live connection.
//
// A malformed, oversized or non-UTF-8 line is counted and reported; replay
// continues with the next line. Only read failures abort. Oversized lines
// are never held in memory beyond the byte limit.

use crate::app::channel::Channel;
use crate::app::console::ConsoleSink;
use crate::app::transport::{Dispatch, Transport};
use crate::core::model::ChannelEvent;
use crate::util::constants::MAX_REPLAY_LINE_BYTES;
use crate::util::error::ViewerError;
use std::io::{self, BufRead, Read};
use std::path::Path;

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records dispatched.
    pub records: usize,
    /// Lines that could not be dispatched.
    pub rejected: usize,
}

/// Feed every non-blank line of `reader` to `transport` as an inbound
/// message. `source` is only used for diagnostics.
pub fn replay<R, C, K>(
    reader: R,
    source: &Path,
    transport: &mut Transport<C, K>,
) -> Result<ReplaySummary, ViewerError>
where
    R: BufRead,
    C: Channel,
    K: ConsoleSink,
{
    replay_limited(reader, source, transport, MAX_REPLAY_LINE_BYTES)
}

fn replay_limited<R, C, K>(
    mut reader: R,
    source: &Path,
    transport: &mut Transport<C, K>,
    max_line_bytes: usize,
) -> Result<ReplaySummary, ViewerError>
where
    R: BufRead,
    C: Channel,
    K: ConsoleSink,
{
    tracing::info!(source = %source.display(), "Replay started");

    let mut summary = ReplaySummary::default();
    transport.handle_event(ChannelEvent::Opened)?;

    let mut buf = Vec::new();
    let mut line_number = 0;
    loop {
        let line = read_line(&mut reader, &mut buf, max_line_bytes).map_err(|e| {
            ViewerError::Io {
                path: source.to_path_buf(),
                operation: "read replay line",
                source: e,
            }
        })?;
        line_number += 1;

        let payload = match line {
            None => break,
            Some(Line::Text(text)) => text,
            Some(Line::TooLong(bytes)) => {
                tracing::warn!(
                    line = line_number,
                    bytes,
                    max = max_line_bytes,
                    "Replay line too long, skipped"
                );
                summary.lines += 1;
                summary.rejected += 1;
                continue;
            }
            Some(Line::NotUtf8) => {
                tracing::warn!(line = line_number, "Replay line is not UTF-8, skipped");
                summary.lines += 1;
                summary.rejected += 1;
                continue;
            }
        };

        let payload = payload.trim();
        if payload.is_empty() {
            continue;
        }
        summary.lines += 1;

        match transport.handle_event(ChannelEvent::Message(payload.to_string())) {
            Ok(Dispatch::Records(n)) => summary.records += n,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Replay line rejected");
                summary.rejected += 1;
            }
        }
    }

    transport.handle_event(ChannelEvent::Closed {
        code: 1000,
        reason: "end of replay".to_string(),
    })?;

    tracing::info!(
        lines = summary.lines,
        records = summary.records,
        rejected = summary.rejected,
        "Replay complete"
    );
    Ok(summary)
}

// =============================================================================
// Line reading
// =============================================================================

enum Line {
    Text(String),
    /// Length of the skipped line in bytes.
    TooLong(usize),
    NotUtf8,
}

/// Read the next line, buffering at most `max_bytes` of it. Returns `None`
/// at end of input. The rest of an over-long line is consumed and dropped.
fn read_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> io::Result<Option<Line>> {
    buf.clear();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader).take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > max_bytes {
        let bytes = buf.len() + skip_line(reader)?;
        return Ok(Some(Line::TooLong(bytes)));
    }

    Ok(Some(match std::str::from_utf8(buf) {
        Ok(text) => Line::Text(text.to_string()),
        Err(_) => Line::NotUtf8,
    }))
}

/// Consume input up to and including the next newline. Returns the number of
/// bytes dropped, not counting the newline.
fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(skipped + pos);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::channel::MemoryChannel;
    use crate::app::console::MemoryConsole;
    use crate::app::transport::TransportConfig;
    use std::io::Cursor;

    fn make_transport() -> Transport<MemoryChannel, MemoryConsole> {
        Transport::new(
            MemoryChannel::new(),
            MemoryConsole::new(),
            TransportConfig::default(),
        )
    }

    #[test]
    fn test_replay_counts_and_skips_blank_lines() {
        let input = "{\"level\":\"INFO\",\"message\":\"a\"}\n\n   \n\
                     [{\"level\":\"WARN\",\"message\":\"b\"},{\"level\":\"FINE\",\"message\":\"c\"}]\n";
        let mut transport = make_transport();
        let summary = replay(Cursor::new(input), Path::new("mem"), &mut transport).unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                lines: 2,
                records: 3,
                rejected: 0
            }
        );
        assert_eq!(transport.console().lines().len(), 3);
    }

    #[test]
    fn test_replay_continues_after_bad_line() {
        let input = "oops\n{\"level\":\"INFO\",\"message\":\"ok\"}\n";
        let mut transport = make_transport();
        let summary = replay(Cursor::new(input), Path::new("mem"), &mut transport).unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.records, 1);
        // Local ERROR for the bad line plus the good record.
        assert_eq!(transport.console().lines().len(), 2);
    }

    #[test]
    fn test_replay_skips_oversized_line_without_losing_the_next() {
        let long = format!("{{\"level\":\"INFO\",\"message\":\"{}\"}}", "x".repeat(64));
        let input = format!("{long}\n{{\"level\":\"WARN\",\"message\":\"ok\"}}\n");
        let mut transport = make_transport();
        let summary =
            replay_limited(Cursor::new(input), Path::new("mem"), &mut transport, 40).unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                lines: 2,
                records: 1,
                rejected: 1
            }
        );
        let lines = transport.console().lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "WARN : ok");
    }

    #[test]
    fn test_read_line_stops_buffering_at_limit() {
        let mut reader = Cursor::new(b"abcdefghij\nxy".to_vec());
        let mut buf = Vec::new();
        match read_line(&mut reader, &mut buf, 4).unwrap() {
            Some(Line::TooLong(bytes)) => assert_eq!(bytes, 10),
            _ => panic!("expected an over-long line"),
        }
        assert!(buf.len() <= 5);
        match read_line(&mut reader, &mut buf, 4).unwrap() {
            Some(Line::Text(text)) => assert_eq!(text, "xy"),
            _ => panic!("expected the next line"),
        }
        assert!(read_line(&mut reader, &mut buf, 4).unwrap().is_none());
    }

    #[test]
    fn test_replay_rejects_invalid_utf8_line_and_continues() {
        let mut input = b"{\"level\":\"INFO\",\"message\":\"\xff\xfe\"}\n".to_vec();
        input.extend_from_slice(b"{\"level\":\"INFO\",\"message\":\"fine\"}\n");
        let mut transport = make_transport();
        let summary = replay(Cursor::new(input), Path::new("mem"), &mut transport).unwrap();
        assert_eq!(summary.lines, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.records, 1);
        let lines = transport.console().lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "INFO : fine");
    }
}
