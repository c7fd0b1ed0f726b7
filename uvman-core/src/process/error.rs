//! Errors surfaced by the process runner.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started (missing, not executable, denied).
    #[error("Failed to launch {}: {source}", path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but returned a failure status.
    #[error("Process exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    /// Waiting on a launched process failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No active `uv` installation has been selected.
    #[error("UV installation not found")]
    NoInstallation,
}

impl ProcessError {
    /// Exit code for `NonZeroExit`, `None` for every other variant.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = ProcessError::NonZeroExit {
            code: 2,
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Process exited with code 2: boom");
        assert_eq!(err.exit_code(), Some(2));
    }

    #[test]
    fn test_launch_failed_message_names_path() {
        let err = ProcessError::LaunchFailed {
            path: PathBuf::from("/nonexistent/uv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nonexistent/uv"));
        assert_eq!(err.exit_code(), None);
    }
}
