//! Error types and Result alias for permashell

/// Result type alias for permashell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for permashell
///
/// Any error returned from [`ShellSession::execute`](crate::ShellSession::execute)
/// means the session may be broken; callers should prefer to recreate the
/// session (and the underlying shell process) rather than continue issuing
/// commands on it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One of the shell's three standard streams could not be obtained
    #[error("Failed to take the {stream} pipe: {reason}")]
    PipeSetup {
        stream: &'static str,
        reason: String,
    },

    /// Failed to spawn the shell process
    #[error("Failed to spawn shell process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Failed to write a command to the shell's stdin
    #[error("Failed to write command to shell stdin: {0}")]
    PipeWrite(#[source] std::io::Error),

    /// Failed to read from the shell's stdout
    #[error("Failed to read shell output: {0}")]
    PipeRead(#[source] std::io::Error),

    /// The shell's stdout closed before the command reported its status
    #[error("Shell output closed before the command reported its exit status")]
    SessionClosed,

    /// A stream handle was lost by an earlier failed command
    #[error("Session is broken by an earlier failed command")]
    SessionBroken,

    /// The background drain task panicked or was cancelled
    #[error("Output drain task failed: {reason}")]
    DrainTask { reason: String },
}
