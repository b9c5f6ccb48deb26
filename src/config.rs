//! Session configuration
//!
//! Tunables for a [`ShellSession`](crate::ShellSession). The defaults are
//! right for interactive shells driven over plain pipes; they exist mostly so
//! tests and unusual hosts can shrink or grow the buffers.

use serde::{Deserialize, Serialize};

/// Configuration for a shell session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of the buffered reader over the shell's stdout, in bytes
    pub read_buffer_size: usize,
    /// How long to keep reading stderr after a command has reported its
    /// status, in milliseconds
    ///
    /// Stderr carries no completion marker, so this window is what catches
    /// bytes the command wrote just before exiting.
    pub stderr_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            stderr_grace_ms: 25,
        }
    }
}
