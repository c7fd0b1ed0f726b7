//! Process runner: launches one external program and observes it.
//!
//! The runner owns the child process and its pipes. Everything the
//! presentation layer may look at (status, output accumulators, the pending
//! interactive command) lives in a shared state object that is published
//! explicitly: lifecycle through a `watch` channel, output increments through
//! the runner's event channel, and a polling snapshot for callers that prefer
//! to read on their own schedule.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use super::decode::Utf8Decoder;
use super::error::ProcessError;
use super::types::{
    CommandResult, EventSender, ExecutionMode, OutputStream, PendingCommand, RunnerEvent,
    RunnerStatus,
};

/// Size of a single pipe read in streamed mode.
const READ_CHUNK_SIZE: usize = 8192;

// ============================================================================
// Executor Seam
// ============================================================================

/// Something that can run `uv` invocations on behalf of the manager.
///
/// [`ProcessRunner`] is the production implementation.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs the executable to completion and returns its output.
    async fn execute(
        &self,
        executable_path: &Path,
        arguments: &[String],
        mode: ExecutionMode,
    ) -> Result<CommandResult, ProcessError>;

    /// Queues the command for an interactive terminal surface.
    fn run_in_terminal(&self, executable_path: &Path, arguments: Vec<String>);
}

// ============================================================================
// Shared State
// ============================================================================

#[derive(Debug, Default)]
struct OutputBuffers {
    stdout: String,
    stderr: String,
}

/// Cancellation handle for the tracked process.
struct TrackedProcess {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

struct Shared {
    status: watch::Sender<RunnerStatus>,
    buffers: Mutex<OutputBuffers>,
    events: Mutex<Option<EventSender>>,
    tracked: Mutex<Option<TrackedProcess>>,
    pending: Mutex<Option<PendingCommand>>,
    generation: AtomicU64,
}

impl Shared {
    fn new(events: Option<EventSender>) -> Self {
        let (status, _) = watch::channel(RunnerStatus::Idle);
        Self {
            status,
            buffers: Mutex::new(OutputBuffers::default()),
            events: Mutex::new(events),
            tracked: Mutex::new(None),
            pending: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    fn publish(&self, event: RunnerEvent) {
        let mut slot = self.events.lock();
        if let Some(tx) = slot.as_ref() {
            if tx.send(event).is_err() {
                debug!("Runner event receiver dropped, no longer publishing");
                *slot = None;
            }
        }
    }

    /// Appends a streamed increment. Superseded runs are dropped.
    fn append(&self, generation: u64, stream: OutputStream, text: &str) {
        if !self.is_current(generation) {
            return;
        }
        {
            let mut buffers = self.buffers.lock();
            match stream {
                OutputStream::Stdout => buffers.stdout.push_str(text),
                OutputStream::Stderr => buffers.stderr.push_str(text),
            }
        }
        let event = match stream {
            OutputStream::Stdout => RunnerEvent::Stdout(text.to_string()),
            OutputStream::Stderr => RunnerEvent::Stderr(text.to_string()),
        };
        self.publish(event);
    }

    /// Resets accumulators and enters `Running`. Returns the new generation.
    fn begin(&self) -> u64 {
        *self.buffers.lock() = OutputBuffers::default();
        self.status.send_replace(RunnerStatus::Running);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Terminates the given generation. Superseded runs leave state alone.
    fn finish(&self, generation: u64, exit_code: Option<i32>) {
        if !self.is_current(generation) {
            debug!(generation, "Superseded process finished");
            return;
        }
        {
            let mut tracked = self.tracked.lock();
            if tracked.as_ref().map(|t| t.generation) == Some(generation) {
                *tracked = None;
            }
        }
        self.status
            .send_replace(RunnerStatus::Terminated { exit_code });
        self.publish(RunnerEvent::Finished { exit_code });
    }
}

// ============================================================================
// Process Runner
// ============================================================================

/// Runs external commands and exposes their output and lifecycle.
///
/// Cloning a runner yields another handle onto the same state. Only one
/// process is tracked at a time: launching a second one replaces the tracked
/// handle without killing the first. Flows that need to run concurrently
/// should each use their own runner.
#[derive(Clone)]
pub struct ProcessRunner {
    shared: Arc<Shared>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("status", &self.status())
            .finish()
    }
}

impl ProcessRunner {
    /// Creates a runner that publishes no events.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new(None)),
        }
    }

    /// Creates a runner that publishes [`RunnerEvent`]s to `events`.
    pub fn with_events(events: EventSender) -> Self {
        Self {
            shared: Arc::new(Shared::new(Some(events))),
        }
    }

    /// Replaces the event sender. `None` stops publishing.
    pub fn set_event_sender(&self, events: Option<EventSender>) {
        *self.shared.events.lock() = events;
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Current lifecycle state.
    pub fn status(&self) -> RunnerStatus {
        *self.shared.status.borrow()
    }

    /// True from launch until the termination handler has completed.
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    /// Subscribes to lifecycle changes.
    pub fn subscribe(&self) -> watch::Receiver<RunnerStatus> {
        self.shared.status.subscribe()
    }

    /// Stdout accumulated by the current or last invocation.
    pub fn output(&self) -> String {
        self.shared.buffers.lock().stdout.clone()
    }

    /// Stderr accumulated by the current or last invocation.
    pub fn error_output(&self) -> String {
        self.shared.buffers.lock().stderr.clone()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Runs `executable_path` with `arguments` until it terminates.
    ///
    /// Resolves with the split output when the exit code is 0, fails with
    /// [`ProcessError::NonZeroExit`] otherwise and with
    /// [`ProcessError::LaunchFailed`] when the program cannot be started.
    pub async fn execute(
        &self,
        executable_path: &Path,
        arguments: &[String],
        mode: ExecutionMode,
    ) -> Result<CommandResult, ProcessError> {
        info!(
            path = %executable_path.display(),
            ?arguments,
            ?mode,
            "Executing command"
        );

        let generation = self.shared.begin();

        let mut cmd = Command::new(executable_path);
        cmd.args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Keep output free of ANSI escapes even if a caller forgets --color never
        cmd.env("NO_COLOR", "1");
        cmd.env("CLICOLOR", "0");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(
                    path = %executable_path.display(),
                    error = %source,
                    "Failed to launch process"
                );
                self.shared.finish(generation, None);
                return Err(ProcessError::LaunchFailed {
                    path: executable_path.to_path_buf(),
                    source,
                });
            }
        };

        debug!(pid = ?child.id(), generation, "Process launched");

        let (cancel_tx, cancel_rx) = oneshot::channel();
        {
            let mut tracked = self.shared.tracked.lock();
            if tracked.is_some() {
                debug!("Replacing tracked process handle; previous process keeps running");
            }
            *tracked = Some(TrackedProcess {
                generation,
                cancel: cancel_tx,
            });
        }

        self.shared.publish(RunnerEvent::Started {
            command: PendingCommand::new(executable_path, arguments.to_vec()),
        });

        let stdout_task = tokio::spawn(read_stream(
            child.stdout.take(),
            OutputStream::Stdout,
            mode,
            generation,
            Arc::clone(&self.shared),
        ));
        let stderr_task = tokio::spawn(read_stream(
            child.stderr.take(),
            OutputStream::Stderr,
            mode,
            generation,
            Arc::clone(&self.shared),
        ));

        let status = wait_for_exit(&mut child, cancel_rx).await;

        // Pipes close on exit; joining the readers flushes the final bytes.
        let stdout = join_reader(stdout_task).await;
        let stderr = join_reader(stderr_task).await;

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to wait for process");
                self.shared.finish(generation, None);
                return Err(ProcessError::Io(e));
            }
        };

        if mode == ExecutionMode::Captured && self.shared.is_current(generation) {
            let mut buffers = self.shared.buffers.lock();
            buffers.stdout = stdout.clone();
            buffers.stderr = stderr.clone();
        }

        let exit_code = exit_code(status);
        self.shared.finish(generation, Some(exit_code));

        debug!(exit_code, "Process terminated");

        if exit_code == 0 {
            Ok(CommandResult {
                stdout,
                stderr,
                exit_code,
            })
        } else {
            Err(ProcessError::NonZeroExit {
                code: exit_code,
                stderr,
            })
        }
    }

    /// Sends a termination signal to the tracked process, if any.
    ///
    /// The pending `execute` still resolves normally with whatever output
    /// was read before the process went away.
    pub fn cancel(&self) {
        match self.shared.tracked.lock().take() {
            Some(tracked) => {
                info!(generation = tracked.generation, "Cancelling process");
                // The receiver is gone if the process already exited
                let _ = tracked.cancel.send(());
            }
            None => debug!("Cancel requested with no process running"),
        }
    }

    // ========================================================================
    // Interactive Hand-off
    // ========================================================================

    /// Queues a command for an interactive terminal surface.
    ///
    /// The runner does not launch or buffer the process; it only records the
    /// command and reports `Running` until [`finish_interactive`] is called.
    ///
    /// [`finish_interactive`]: Self::finish_interactive
    pub fn run_in_terminal(&self, executable_path: &Path, arguments: Vec<String>) {
        let pending = PendingCommand::new(executable_path, arguments);
        info!(command = %pending, "Queued command for terminal");

        self.shared.begin();
        *self.shared.pending.lock() = Some(pending.clone());
        self.shared.publish(RunnerEvent::Started { command: pending });
    }

    /// Peeks at the queued interactive command.
    pub fn pending(&self) -> Option<PendingCommand> {
        self.shared.pending.lock().clone()
    }

    /// Consumes the queued interactive command.
    pub fn take_pending(&self) -> Option<PendingCommand> {
        self.shared.pending.lock().take()
    }

    /// Marks the interactive command as finished.
    pub fn finish_interactive(&self, exit_code: Option<i32>) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        self.shared.pending.lock().take();
        self.shared.finish(generation, exit_code);
    }
}

#[async_trait]
impl CommandExecutor for ProcessRunner {
    async fn execute(
        &self,
        executable_path: &Path,
        arguments: &[String],
        mode: ExecutionMode,
    ) -> Result<CommandResult, ProcessError> {
        ProcessRunner::execute(self, executable_path, arguments, mode).await
    }

    fn run_in_terminal(&self, executable_path: &Path, arguments: Vec<String>) {
        ProcessRunner::run_in_terminal(self, executable_path, arguments)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads one pipe to EOF and returns everything it produced.
///
/// In streamed mode every increment is appended to the shared accumulator
/// and published as it arrives.
async fn read_stream<R>(
    reader: Option<R>,
    stream: OutputStream,
    mode: ExecutionMode,
    generation: u64,
    shared: Arc<Shared>,
) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(String::new());
    };

    match mode {
        ExecutionMode::Captured => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        ExecutionMode::Streamed => {
            let mut decoder = Utf8Decoder::new();
            let mut collected = String::new();
            let mut buf = vec![0u8; READ_CHUNK_SIZE];

            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() {
                    shared.append(generation, stream, &text);
                    collected.push_str(&text);
                }
            }

            let tail = decoder.finish();
            if !tail.is_empty() {
                shared.append(generation, stream, &tail);
                collected.push_str(&tail);
            }

            debug!(stream = stream.as_str(), bytes = collected.len(), "Stream closed");
            Ok(collected)
        }
    }
}

async fn join_reader(task: tokio::task::JoinHandle<io::Result<String>>) -> String {
    match task.await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to read process output");
            String::new()
        }
        Err(e) => {
            warn!(error = %e, "Output reader task failed");
            String::new()
        }
    }
}

/// Waits for the child, forwarding a cancellation request as a signal.
async fn wait_for_exit(
    child: &mut Child,
    mut cancel_rx: oneshot::Receiver<()>,
) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => return status,
        Ok(()) = &mut cancel_rx => {}
    }

    terminate(child);
    child.wait().await
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // ESRCH: already exited
        debug!(pid, error = %e, "Failed to send SIGTERM");
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Failed to kill process");
    }
}

/// Exit code of a finished process; signals map to `128 + signal`.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
