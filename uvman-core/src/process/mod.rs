//! Process execution for external command-line tools.
//!
//! # Architecture
//!
//! - `types`: Execution strategies, lifecycle state, results and events
//! - `error`: Launch and exit failures
//! - `decode`: Incremental UTF-8 decoding of pipe reads
//! - `runner`: The `ProcessRunner` and the `CommandExecutor` seam
//! - `terminal`: Terminal-attached execution of queued interactive commands
//!
//! # Example
//!
//! ```ignore
//! use uvman_core::process::{event_channel, ExecutionMode, ProcessRunner, RunnerEvent};
//!
//! let (tx, mut rx) = event_channel();
//! let runner = ProcessRunner::with_events(tx);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         if let RunnerEvent::Stderr(text) = event {
//!             eprint!("{}", text);
//!         }
//!     }
//! });
//!
//! let result = runner
//!     .execute(uv_path, &["tool".into(), "dir".into()], ExecutionMode::Streamed)
//!     .await?;
//! ```

pub mod decode;
pub mod error;
pub mod runner;
pub mod terminal;
pub mod types;

pub use error::ProcessError;
pub use runner::{CommandExecutor, ProcessRunner};
pub use terminal::{drain_pending, run_attached};
pub use types::{
    event_channel, CommandResult, EventReceiver, EventSender, ExecutionMode, ExecutionStrategy,
    OutputStream, PendingCommand, RunnerEvent, RunnerStatus,
};
