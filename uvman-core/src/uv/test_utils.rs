//! Scripted [`CommandExecutor`] for exercising the manager without `uv`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::process::{CommandExecutor, CommandResult, ExecutionMode, ProcessError};

#[derive(Debug, Clone)]
enum Reply {
    Ok(String),
    Fail(i32, String),
}

/// One recorded invocation. `mode` is `None` for terminal hand-offs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub mode: Option<ExecutionMode>,
}

impl Call {
    pub fn joined(&self) -> String {
        self.args.join(" ")
    }
}

/// Replies are keyed by the space-joined argument list, optionally scoped to
/// one executable path. Unknown invocations fail to launch.
#[derive(Default)]
pub struct FakeExecutor {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, args: &str, stdout: &str) -> Self {
        self.set(args.to_string(), Reply::Ok(stdout.to_string()));
        self
    }

    pub fn respond_for(self, path: &Path, args: &str, stdout: &str) -> Self {
        self.set(scoped_key(path, args), Reply::Ok(stdout.to_string()));
        self
    }

    pub fn fail(self, args: &str, code: i32, stderr: &str) -> Self {
        self.set(args.to_string(), Reply::Fail(code, stderr.to_string()));
        self
    }

    /// Replaces a reply after construction, e.g. to simulate an upgrade.
    pub fn set_reply(&self, args: &str, stdout: &str) {
        self.set(args.to_string(), Reply::Ok(stdout.to_string()));
    }

    pub fn set_failure(&self, args: &str, code: i32, stderr: &str) {
        self.set(args.to_string(), Reply::Fail(code, stderr.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn set(&self, key: String, reply: Reply) {
        self.replies.lock().insert(key, reply);
    }

    fn lookup(&self, path: &Path, args: &[String]) -> Option<Reply> {
        let joined = args.join(" ");
        let replies = self.replies.lock();
        replies
            .get(&scoped_key(path, &joined))
            .or_else(|| replies.get(&joined))
            .cloned()
    }
}

fn scoped_key(path: &Path, args: &str) -> String {
    format!("{}|{}", path.display(), args)
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(
        &self,
        executable_path: &Path,
        arguments: &[String],
        mode: ExecutionMode,
    ) -> Result<CommandResult, ProcessError> {
        self.calls.lock().push(Call {
            path: executable_path.to_path_buf(),
            args: arguments.to_vec(),
            mode: Some(mode),
        });

        match self.lookup(executable_path, arguments) {
            Some(Reply::Ok(stdout)) => Ok(CommandResult {
                stdout,
                stderr: String::new(),
                exit_code: 0,
            }),
            Some(Reply::Fail(code, stderr)) => Err(ProcessError::NonZeroExit { code, stderr }),
            None => Err(ProcessError::LaunchFailed {
                path: executable_path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }

    fn run_in_terminal(&self, executable_path: &Path, arguments: Vec<String>) {
        self.calls.lock().push(Call {
            path: executable_path.to_path_buf(),
            args: arguments,
            mode: None,
        });
    }
}
