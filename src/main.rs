//! Permashell demo driver
//!
//! Spawns a shell, runs a couple of commands through one persistent session
//! with stdout forwarded to this process, and prints each exit code.

use std::env;

use anyhow::Context;
use tracing::info;

use permashell::{Command, ShellSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .init();

    let shell = env::args().nth(1).unwrap_or_else(|| "bash".to_string());
    info!("starting {} v{} against {}", permashell::NAME, permashell::VERSION, shell);

    let (mut session, mut child) =
        ShellSession::spawn(&shell).with_context(|| format!("failed to start '{}'", shell))?;

    for statement in ["echo 'foo'", "echo 'bar' && exit 1"] {
        let cmd = Command::new(statement).with_stdout(Box::new(tokio::io::stdout()));
        let exit_code = session
            .execute(cmd)
            .await
            .with_context(|| format!("command failed: {}", statement))?;
        println!("Command finished with exit code {}", exit_code);
    }

    child.kill().await.context("failed to stop the shell")?;
    Ok(())
}
