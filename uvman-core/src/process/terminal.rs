//! Terminal-attached execution of queued interactive commands.
//!
//! The process inherits stdin/stdout/stderr so the user interacts with it
//! directly; nothing is captured or parsed.

use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use super::error::ProcessError;
use super::runner::{exit_code, ProcessRunner};
use super::types::PendingCommand;

/// Runs `pending` attached to the current terminal and returns its exit code.
pub async fn run_attached(pending: &PendingCommand) -> Result<i32, ProcessError> {
    info!(command = %pending, "Running command in terminal");

    let mut child = Command::new(&pending.executable_path)
        .args(&pending.arguments)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| ProcessError::LaunchFailed {
            path: pending.executable_path.clone(),
            source,
        })?;

    let status = child.wait().await?;
    Ok(exit_code(status))
}

/// Consumes the runner's pending command, runs it attached, and marks the
/// runner finished.
///
/// Returns `Ok(None)` when nothing was queued.
pub async fn drain_pending(runner: &ProcessRunner) -> Result<Option<i32>, ProcessError> {
    let Some(pending) = runner.take_pending() else {
        return Ok(None);
    };

    match run_attached(&pending).await {
        Ok(code) => {
            runner.finish_interactive(Some(code));
            Ok(Some(code))
        }
        Err(e) => {
            runner.finish_interactive(None);
            Err(e)
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_run_attached_returns_exit_code() {
        let pending = PendingCommand::new(
            "/bin/sh",
            vec!["-c".to_string(), "exit 3".to_string()],
        );
        assert_eq!(run_attached(&pending).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_run_attached_reports_signal_exit() {
        let pending = PendingCommand::new(
            "/bin/sh",
            vec!["-c".to_string(), "kill -TERM $$".to_string()],
        );
        assert_eq!(run_attached(&pending).await.unwrap(), 128 + 15);
    }

    #[tokio::test]
    async fn test_run_attached_missing_executable() {
        let pending = PendingCommand::new("/nonexistent/uvman/uv", Vec::new());
        let err = run_attached(&pending).await.unwrap_err();
        assert!(matches!(err, ProcessError::LaunchFailed { .. }));
    }

    #[tokio::test]
    async fn test_drain_pending_finishes_runner() {
        let runner = ProcessRunner::new();
        runner.run_in_terminal(
            Path::new("/bin/sh"),
            vec!["-c".to_string(), "exit 0".to_string()],
        );
        assert!(runner.is_running());

        assert_eq!(drain_pending(&runner).await.unwrap(), Some(0));
        assert!(!runner.is_running());
        assert_eq!(drain_pending(&runner).await.unwrap(), None);
    }
}
