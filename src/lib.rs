//! Permashell - persistent interactive shell sessions over plain pipes
//!
//! This library runs a sequence of shell commands inside one long-lived
//! shell process and reliably recovers each command's exit status and output
//! without restarting the shell between commands.
//!
//! A shell's stdout is an unstructured byte stream: nothing in it says
//! "command N finished with status S". Permashell frames command completion
//! itself by appending a trailer to every submitted command that echoes a
//! freshly generated sentinel token together with the command's exit status,
//! and by scanning the output stream for that exact line. Everything before
//! the sentinel is the command's real output and is forwarded untouched; the
//! sentinel line itself is swallowed and surfaced as a parsed status.
//!
//! ## Module Organization
//!
//! - [`session`] - The [`ShellSession`], the `Piper` stream capability, and
//!   the background drain tasks
//! - [`intercept`] - The stream filter that splits output from the
//!   completion signal in a single forward pass
//! - [`models`] - Value types: [`Command`] and [`SentinelToken`]
//! - [`config`] - Session tunables
//! - [`mod@error`] - Error types and the crate [`Result`] alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use permashell::{Command, ShellSession};
//!
//! # async fn run() -> permashell::Result<()> {
//! let (mut session, _child) = ShellSession::spawn("bash")?;
//!
//! let status = session
//!     .execute(Command::new("echo 'foo'").with_stdout(Box::new(tokio::io::stdout())))
//!     .await?;
//! assert_eq!(status, 0);
//!
//! // Each statement runs in its own `sh -c` subshell, so chain steps
//! // that depend on each other into one command.
//! session.execute(Command::new("cd /tmp && ls")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Limits
//!
//! - One command in flight per session; `execute` takes `&mut self`.
//! - No PTY: full-screen and interactive programs are out of scope.
//! - No timeouts: a caller wanting one must kill the underlying process,
//!   which surfaces here as a pipe error.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod intercept;
pub mod models;
pub mod session;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use intercept::InterceptReader;
pub use models::{Command, OutputSink, SentinelToken};
pub use session::{OutPiper, PipeReader, PipeWriter, Piper, ShellSession};

/// The current version of permashell from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
