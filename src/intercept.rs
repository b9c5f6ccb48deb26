//! Intercepting stream reader
//!
//! Wraps the shell's stdout and passes bytes through unchanged until it
//! recognizes the line carrying the session's current sentinel token plus a
//! trailing exit status. At that point the reader records the status, swallows
//! the marker, and reports end-of-stream for every read that follows.
//!
//! The design is line-oriented and single-pass: each pull reads one
//! newline-delimited line, tests it against the sentinel grammar, and either
//! hands it to the caller or terminates. No backtracking past a newline, no
//! buffering beyond the current line. Arbitrary binary content is tolerated
//! anywhere except on the exact line carrying the sentinel.

use std::io;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::models::SentinelToken;

/// Sentinel line grammar: a 36-character token, one space, a decimal status,
/// anchored at the end of the line.
///
/// End-anchored rather than full-line so that a command whose output does not
/// end in a trailing newline still terminates cleanly: its final partial line
/// arrives glued to the front of the sentinel echo, and the prefix is
/// forwarded as ordinary output. The token is fixed-length and sits directly
/// before the single space ahead of the digits, so at most one position in
/// the line can match.
static SENTINEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z0-9-]{36}) ([0-9]+)$").expect("sentinel pattern is valid")
});

/// Stream filter that forwards ordinary output and consumes the sentinel line
///
/// Two states: *streaming* while the exit status is unobserved, *terminated*
/// once the sentinel for the configured token has been seen. A terminated
/// reader yields no further bytes, even if the source has more buffered —
/// safe only because the session never writes the next command before the
/// current `execute` call returns.
pub struct InterceptReader<R> {
    source: BufReader<R>,
    token: SentinelToken,
    exit_status: Option<i32>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> InterceptReader<R> {
    /// Wrap `source`, watching for the sentinel line keyed to `token`
    pub fn new(source: R, token: SentinelToken) -> Self {
        Self::with_capacity(4096, source, token)
    }

    /// Wrap `source` with an explicit buffer capacity
    pub fn with_capacity(capacity: usize, source: R, token: SentinelToken) -> Self {
        Self {
            source: BufReader::with_capacity(capacity, source),
            token,
            exit_status: None,
            line: Vec::new(),
        }
    }

    /// The exit status parsed from the sentinel line, once observed
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    /// Unwrap the underlying source
    ///
    /// Bytes still sitting in the internal buffer are dropped; callers hand
    /// the source back to the session only after this reader has terminated.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    /// Pull the next run of output bytes
    ///
    /// An empty slice signals end-of-stream: either the sentinel line for
    /// this reader's token was recognized (check [`exit_status`]) or the
    /// source itself closed (status stays `None`). Read errors from the
    /// source propagate unchanged and leave the state untouched.
    ///
    /// # Panics
    ///
    /// Panics if the matched status field fails to parse as an integer. The
    /// grammar restricts that field to digits, so this is an invariant
    /// violation, not a recoverable condition; the session isolates it to
    /// the one in-flight command.
    ///
    /// [`exit_status`]: InterceptReader::exit_status
    pub async fn next_chunk(&mut self) -> io::Result<&[u8]> {
        if self.exit_status.is_some() {
            return Ok(&[]);
        }

        self.line.clear();
        let n = self.source.read_until(b'\n', &mut self.line).await?;
        if n == 0 {
            // source end-of-stream before any sentinel
            return Ok(&[]);
        }

        // Grammar matching happens on the line without its terminator.
        let stripped = if self.line.ends_with(b"\n") {
            &self.line[..self.line.len() - 1]
        } else {
            &self.line[..]
        };

        let mut matched_prefix = None;
        if let Some(caps) = SENTINEL_LINE.captures(stripped) {
            let candidate = std::str::from_utf8(&caps[1])
                .ok()
                .and_then(SentinelToken::parse);
            // A token-shaped line that is not a UUID, or another token's
            // marker, is ordinary output.
            if candidate == Some(self.token) {
                let digits = std::str::from_utf8(&caps[2])
                    .expect("sentinel grammar restricts the status field to ASCII digits");
                let status: i32 = digits
                    .parse()
                    .expect("sentinel grammar restricts the status field to digits");
                trace!(status, "sentinel line matched");
                self.exit_status = Some(status);
                matched_prefix = Some(caps.get(1).map(|m| m.start()).unwrap_or(0));
            }
        }

        match matched_prefix {
            // The sentinel itself is swallowed; anything the command wrote on
            // the same line (output without a trailing newline) is delivered.
            Some(prefix_len) => Ok(&self.line[..prefix_len]),
            None => Ok(&self.line[..]),
        }
    }
}
