//! Persistent shell session
//!
//! A [`ShellSession`] owns the write side of a shell process's stdin and the
//! read sides of its stdout/stderr, and runs one command at a time through
//! it. Each [`execute`](ShellSession::execute) call injects the command plus
//! a trailer that echoes a fresh sentinel token and the command's exit
//! status; a background task drains the intercepting reader into the
//! command's sink until the sentinel lands, at which point the parsed status
//! is returned.
//!
//! The session does not own the process lifecycle, only the pipes. Each
//! statement is handed to `sh -c`, so it runs in its own subshell: working
//! directory and variable changes do not carry over to later commands. The
//! trailer re-arms only the outer shell's `$?` with the statement's status.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::intercept::InterceptReader;
use crate::models::{Command, OutputSink, SentinelToken};

/// Read side of a process pipe
pub type PipeReader = Box<dyn AsyncRead + Send + Unpin>;
/// Write side of a process pipe
pub type PipeWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shell variable used by the injected trailer to hold the exit status
const STATUS_VAR: &str = "__PERMASHELL_STATUS";

/// Capability for acquiring a process's output streams
///
/// Each stream is obtainable exactly once; a second acquisition fails with
/// [`Error::PipeSetup`].
pub trait OutPiper {
    /// Take the read side of the process's stdout
    fn stdout_pipe(&mut self) -> Result<PipeReader>;
    /// Take the read side of the process's stderr
    fn stderr_pipe(&mut self) -> Result<PipeReader>;
}

/// Capability for acquiring all three standard streams of a process
///
/// Implemented for [`tokio::process::Child`]; any process-like object, real
/// or test double, can stand in.
pub trait Piper: OutPiper {
    /// Take the write side of the process's stdin
    fn stdin_pipe(&mut self) -> Result<PipeWriter>;
}

impl OutPiper for tokio::process::Child {
    fn stdout_pipe(&mut self) -> Result<PipeReader> {
        self.stdout
            .take()
            .map(|s| Box::new(s) as PipeReader)
            .ok_or(Error::PipeSetup {
                stream: "stdout",
                reason: "not captured or already taken".to_string(),
            })
    }

    fn stderr_pipe(&mut self) -> Result<PipeReader> {
        self.stderr
            .take()
            .map(|s| Box::new(s) as PipeReader)
            .ok_or(Error::PipeSetup {
                stream: "stderr",
                reason: "not captured or already taken".to_string(),
            })
    }
}

impl Piper for tokio::process::Child {
    fn stdin_pipe(&mut self) -> Result<PipeWriter> {
        self.stdin
            .take()
            .map(|s| Box::new(s) as PipeWriter)
            .ok_or(Error::PipeSetup {
                stream: "stdin",
                reason: "not captured or already taken".to_string(),
            })
    }
}

/// A persistent interactive shell driven over plain pipes
///
/// At most one command is in flight at a time; `execute` takes `&mut self`,
/// so the borrow checker enforces the protocol's non-reentrancy.
pub struct ShellSession {
    stdin: PipeWriter,
    stdout: Option<PipeReader>,
    stderr: Option<PipeReader>,
    config: SessionConfig,
}

impl ShellSession {
    /// Open a session over an already-configured process
    ///
    /// The process's pipes must be established (all three captured) but the
    /// process itself may start before or immediately after this call.
    pub fn new(piper: &mut dyn Piper) -> Result<Self> {
        Self::with_config(piper, SessionConfig::default())
    }

    /// Open a session with explicit configuration
    pub fn with_config(piper: &mut dyn Piper, config: SessionConfig) -> Result<Self> {
        let stdin = piper.stdin_pipe()?;
        let stdout = piper.stdout_pipe()?;
        let stderr = piper.stderr_pipe()?;
        debug!("shell session opened");
        Ok(Self {
            stdin,
            stdout: Some(stdout),
            stderr: Some(stderr),
            config,
        })
    }

    /// Spawn `program` with piped stdio and open a session on it
    ///
    /// The child is returned alongside the session; killing it is the
    /// caller's job (it is `kill_on_drop`, so dropping it suffices).
    pub fn spawn(program: &str) -> Result<(Self, tokio::process::Child)> {
        let mut child = tokio::process::Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::Spawn)?;
        let session = Self::new(&mut child)?;
        Ok((session, child))
    }

    /// Run one command and return its exit status
    ///
    /// Output is forwarded to the command's sinks as it arrives; the call
    /// returns only after all of the command's stdout has been forwarded and
    /// its exit status parsed. Any error means the session should be
    /// considered broken and recreated.
    pub async fn execute(&mut self, mut cmd: Command) -> Result<i32> {
        let token = SentinelToken::generate();
        let stdout = self.stdout.take().ok_or(Error::SessionBroken)?;
        let stderr = self.stderr.take().ok_or(Error::SessionBroken)?;

        let intercept =
            InterceptReader::with_capacity(self.config.read_buffer_size, stdout, token);
        let drain = tokio::spawn(drain_stdout(intercept, cmd.stdout.take()));

        let (stop_tx, stop_rx) = oneshot::channel();
        let grace = Duration::from_millis(self.config.stderr_grace_ms);
        let pump = tokio::spawn(pump_stderr(stderr, cmd.stderr.take(), stop_rx, grace));

        let statement = cmd.statement();
        debug!(%token, statement = %statement, "dispatching command");
        let trailer = render_trailer(&statement, &token);

        let write_result = async {
            self.stdin.write_all(trailer.as_bytes()).await?;
            self.stdin.flush().await
        }
        .await;

        if let Err(e) = write_result {
            // The sentinel will never arrive; tear the tasks down. Both
            // stream handles are lost, which is fine: a failed write means
            // the shell is gone.
            drain.abort();
            let _ = stop_tx.send(());
            if let Ok(reader) = pump.await {
                self.stderr = Some(reader);
            }
            return Err(Error::PipeWrite(e));
        }

        let drained = drain.await;

        // Stdout is settled one way or the other; stop the stderr pump and
        // put the handle back for the next command.
        let _ = stop_tx.send(());
        match pump.await {
            Ok(reader) => self.stderr = Some(reader),
            Err(e) => warn!("stderr pump task failed: {}", e),
        }

        let (intercept, copy_result) = drained.map_err(|e| Error::DrainTask {
            reason: e.to_string(),
        })?;
        let status = intercept.exit_status();
        let forwarded = copy_result.map_err(Error::PipeRead);
        self.stdout = Some(intercept.into_inner());

        match (status, forwarded?) {
            (Some(status), forwarded) => {
                debug!(status, forwarded, "command completed");
                Ok(status)
            }
            // Clean end-of-stream before the sentinel: the shell died.
            (None, _) => Err(Error::SessionClosed),
        }
    }
}

/// Render the wire-level trailer for one command
///
/// `sh -c` runs the statement in a subshell; the status lands in a private
/// variable, gets echoed after the token, and finally re-arms the outer
/// shell's own `$?` so caller scripts that consult it across commands keep
/// working.
fn render_trailer(statement: &str, token: &SentinelToken) -> String {
    format!(
        "sh -c {quoted}; {var}=$?; echo {token} ${var}; echo \"exit ${var}\"|sh\n",
        quoted = shell_words::quote(statement),
        var = STATUS_VAR,
        token = token,
    )
}

/// Copy from the intercepting reader into the command's stdout sink until
/// the reader reports end-of-stream
///
/// Sink write failures are logged and forwarding stops, but draining
/// continues: the sentinel still has to be observed or the session is lost.
/// Returns the reader (for handle recovery) and the forwarded byte count or
/// the read error that ended the copy.
async fn drain_stdout<R>(
    mut reader: InterceptReader<R>,
    mut sink: Option<OutputSink>,
) -> (InterceptReader<R>, std::io::Result<u64>)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut forwarded = 0u64;
    let mut read_error = None;
    loop {
        match reader.next_chunk().await {
            Ok(chunk) if chunk.is_empty() => break,
            Ok(chunk) => {
                forwarded += chunk.len() as u64;
                let failed = match sink.as_mut() {
                    Some(out) => match out.write_all(chunk).await {
                        Ok(()) => false,
                        Err(e) => {
                            warn!("stdout sink rejected output; discarding the rest: {}", e);
                            true
                        }
                    },
                    None => false,
                };
                if failed {
                    sink = None;
                }
            }
            Err(e) => {
                read_error = Some(e);
                break;
            }
        }
    }
    if let Some(out) = sink.as_mut() {
        let _ = out.flush().await;
    }
    let result = match read_error {
        Some(e) => Err(e),
        None => Ok(forwarded),
    };
    (reader, result)
}

/// Forward stderr bytes for the duration of one command
///
/// Stderr carries no sentinel, so this pump runs until told to stop, then
/// takes one short grace pass to pick up bytes the command wrote just before
/// reporting its status. The pipe is drained even with no sink attached; a
/// chatty command would otherwise deadlock on a full kernel buffer.
async fn pump_stderr(
    mut stderr: PipeReader,
    mut sink: Option<OutputSink>,
    mut stop: oneshot::Receiver<()>,
    grace: Duration,
) -> PipeReader {
    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            biased;
            res = stderr.read(&mut buf) => match res {
                Ok(0) => break,
                Ok(n) => forward(&mut sink, &buf[..n]).await,
                Err(e) => {
                    debug!("stderr read failed: {}", e);
                    break;
                }
            },
            _ = &mut stop => {
                // One deadline covers the whole grace pass. A background
                // process the command left behind can keep the pipe busy
                // indefinitely; the pump must not let that stall `execute`.
                let _ = timeout(grace, async {
                    loop {
                        match stderr.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => forward(&mut sink, &buf[..n]).await,
                        }
                    }
                })
                .await;
                break;
            }
        }
    }
    if let Some(out) = sink.as_mut() {
        let _ = out.flush().await;
    }
    stderr
}

/// Best-effort write to an optional sink; a failed write drops the sink
async fn forward(sink: &mut Option<OutputSink>, bytes: &[u8]) {
    let failed = match sink.as_mut() {
        Some(out) => match out.write_all(bytes).await {
            Ok(()) => false,
            Err(e) => {
                warn!("stderr sink rejected output; discarding the rest: {}", e);
                true
            }
        },
        None => false,
    };
    if failed {
        *sink = None;
    }
}
