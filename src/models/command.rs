//! Command Model
//!
//! A command is a value object: the shell statement to execute plus optional
//! destinations for the output it produces. One command maps to exactly one
//! `execute` call on a session.

use std::fmt;

use tokio::io::AsyncWrite;

/// Destination for forwarded command output
///
/// Any async byte-stream consumer works: a file, a pipe, `tokio::io::stdout`,
/// an in-memory buffer in tests.
pub type OutputSink = Box<dyn AsyncWrite + Send + Unpin>;

/// A single shell command and the sinks its output should be forwarded to
pub struct Command {
    /// Ordered argument texts, rendered as one shell statement
    args: Vec<String>,
    /// Where to forward the command's stdout (discarded if `None`)
    pub stdout: Option<OutputSink>,
    /// Where to forward the command's stderr (discarded if `None`)
    pub stderr: Option<OutputSink>,
}

impl Command {
    /// Create a command from a single shell statement
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            args: vec![statement.into()],
            stdout: None,
            stderr: None,
        }
    }

    /// Append another argument text to the statement
    pub fn arg(mut self, text: impl Into<String>) -> Self {
        self.args.push(text.into());
        self
    }

    /// Forward the command's stdout to `sink`
    pub fn with_stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = Some(sink);
        self
    }

    /// Forward the command's stderr to `sink`
    pub fn with_stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = Some(sink);
        self
    }

    /// Render the argument texts as a single shell statement
    pub fn statement(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("args", &self.args)
            .field("stdout", &self.stdout.as_ref().map(|_| "<sink>"))
            .field("stderr", &self.stderr.as_ref().map(|_| "<sink>"))
            .finish()
    }
}
