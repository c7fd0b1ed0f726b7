//! Core types for the process runner.
//!
//! Execution strategies, the lifecycle state machine, results and the events
//! published to whichever context owns the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

// ============================================================================
// Execution Strategy
// ============================================================================

/// How output of a captured invocation is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Buffer stdout and stderr, deliver them once the process exits.
    #[default]
    Captured,
    /// Publish stdout and stderr increments as the OS hands them over.
    Streamed,
}

/// Strategy chosen by a caller for a mutating `uv` operation.
///
/// `Captured` and `Streamed` run through [`super::ProcessRunner::execute`];
/// `Interactive` hands the command off to a terminal surface instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    Captured,
    Streamed,
    Interactive,
}

impl ExecutionStrategy {
    /// The capture mode backing this strategy, or `None` for a hand-off.
    pub fn mode(self) -> Option<ExecutionMode> {
        match self {
            Self::Captured => Some(ExecutionMode::Captured),
            Self::Streamed => Some(ExecutionMode::Streamed),
            Self::Interactive => None,
        }
    }

    /// Picks interactive or streamed execution from a terminal preference.
    pub fn from_terminal_preference(use_terminal: bool) -> Self {
        if use_terminal {
            Self::Interactive
        } else {
            Self::Streamed
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captured => write!(f, "captured"),
            Self::Streamed => write!(f, "streamed"),
            Self::Interactive => write!(f, "interactive"),
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle of the process tracked by a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerStatus {
    /// Nothing has been launched yet.
    #[default]
    Idle,
    /// A process (or an interactive hand-off) is in flight.
    Running,
    /// The last process finished. `None` when it could not be launched.
    Terminated { exit_code: Option<i32> },
}

impl RunnerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Output of one finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, the way a terminal would show both.
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }
}

/// A command queued for an interactive terminal surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub executable_path: PathBuf,
    pub arguments: Vec<String>,
}

impl PendingCommand {
    pub fn new(executable_path: impl Into<PathBuf>, arguments: Vec<String>) -> Self {
        Self {
            executable_path: executable_path.into(),
            arguments,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }
}

impl fmt::Display for PendingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable_path.display())?;
        for arg in &self.arguments {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

/// Which pipe an increment was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Events sent from the runner to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// A process was launched, or an interactive command was queued.
    Started { command: PendingCommand },

    /// Streaming text read from stdout.
    Stdout(String),

    /// Streaming text read from stderr.
    Stderr(String),

    /// The process terminated. `None` when it never launched.
    Finished { exit_code: Option<i32> },
}

/// Sender for runner events.
pub type EventSender = mpsc::UnboundedSender<RunnerEvent>;

/// Receiver for runner events.
pub type EventReceiver = mpsc::UnboundedReceiver<RunnerEvent>;

/// Create an event channel for streaming runner events.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_mode() {
        assert_eq!(
            ExecutionStrategy::Captured.mode(),
            Some(ExecutionMode::Captured)
        );
        assert_eq!(
            ExecutionStrategy::Streamed.mode(),
            Some(ExecutionMode::Streamed)
        );
        assert_eq!(ExecutionStrategy::Interactive.mode(), None);
    }

    #[test]
    fn test_strategy_from_terminal_preference() {
        assert_eq!(
            ExecutionStrategy::from_terminal_preference(true),
            ExecutionStrategy::Interactive
        );
        assert_eq!(
            ExecutionStrategy::from_terminal_preference(false),
            ExecutionStrategy::Streamed
        );
    }

    #[test]
    fn test_status_is_running() {
        assert!(!RunnerStatus::Idle.is_running());
        assert!(RunnerStatus::Running.is_running());
        assert!(!RunnerStatus::Terminated { exit_code: Some(0) }.is_running());
    }

    #[test]
    fn test_command_result_combined() {
        let result = CommandResult {
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
            exit_code: 0,
        };
        assert!(result.success());
        assert_eq!(result.combined(), "out\nerr\n");
    }

    #[test]
    fn test_pending_command_display() {
        let pending = PendingCommand::new(
            "/usr/bin/uv",
            vec!["self".to_string(), "update".to_string()],
        );
        assert_eq!(pending.to_string(), "/usr/bin/uv self update");
    }

    #[test]
    fn test_event_channel() {
        let (tx, _rx) = event_channel();
        assert!(tx.send(RunnerEvent::Stdout("test".to_string())).is_ok());
    }
}
