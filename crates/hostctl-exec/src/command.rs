use std::process::{Output, Stdio};

use hostctl_core::ExternalError;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

impl From<CommandError> for ExternalError {
    fn from(err: CommandError) -> Self {
        ExternalError::Failed(err.to_string())
    }
}

/// Run a command to completion and return its output whatever the exit
/// status. The child is killed if the returned future is dropped, which is
/// how callers' timeouts reach the process.
pub async fn run_unchecked(program: &str, args: &[&str]) -> Result<Output, CommandError> {
    let command = render(program, args);
    debug!("running {command}");
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| CommandError::Spawn { command, source })
}

/// Like [`run_unchecked`], but a non-zero exit status is an error.
pub async fn run_checked(program: &str, args: &[&str]) -> Result<Output, CommandError> {
    let output = run_unchecked(program, args).await?;
    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(CommandError::Failed {
        command: render(program, args),
        status: output.status,
        stderr: stderr.trim().to_string(),
    })
}

fn render(program: &str, args: &[&str]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
