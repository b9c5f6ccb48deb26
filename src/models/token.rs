//! Sentinel Token Model
//!
//! A sentinel token marks the boundary between one command's output and its
//! completion signal on the shell's stdout stream. Tokens are UUID v4 values
//! rendered in the canonical hyphenated form: 36 characters drawn from
//! `[a-z0-9-]`, unique with overwhelming probability for the lifetime of the
//! process. A token is scoped to exactly one `execute` call and discarded
//! afterwards; reusing one would race against stale bytes still buffered in
//! the output stream.

use std::fmt;
use uuid::Uuid;

/// Rendered length of a token in bytes
pub const TOKEN_LEN: usize = 36;

/// Unique marker injected into the shell's output stream to signal
/// "command complete, here is its exit status"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelToken(Uuid);

impl SentinelToken {
    /// Generate a fresh token
    ///
    /// Infallible: UUID v4 generation draws from the OS entropy source and
    /// aborts rather than returning a weak value if that source is broken.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a candidate token from its textual form
    ///
    /// Used when matching lines from the output stream: a line may carry
    /// something token-shaped that is not a valid UUID, or a valid UUID that
    /// belongs to another session. Comparison happens on the parsed value,
    /// so case differences in the rendering do not matter.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl fmt::Display for SentinelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // hyphenated form, exactly TOKEN_LEN characters
        write!(f, "{}", self.0)
    }
}
