//! uvman Core Library
//!
//! Everything needed to manage `uv` and the Python tools it installs,
//! independent of any front-end:
//!
//! - Process runner with captured, streamed and terminal hand-off execution
//! - Parsers for `uv --version` and `uv tool list` output
//! - Installation detection and the `UvManager` service
//! - Settings and command history in SQLite

pub mod config;
pub mod db;
pub mod parser;
pub mod process;
pub mod uv;

pub use config::Settings;
pub use db::{CommandRecord, Database};

pub use parser::{compare_versions, parse_tool_listing, parse_version, sort_installations};

pub use process::{
    drain_pending, event_channel, run_attached, CommandExecutor, CommandResult, EventReceiver,
    EventSender, ExecutionMode, ExecutionStrategy, OutputStream, PendingCommand, ProcessError,
    ProcessRunner, RunnerEvent, RunnerStatus,
};

pub use uv::{
    detect_installations, Executable, Installation, ManagedTool, UvCommand, UvManager,
    UV_INSTALL_SCRIPT, UV_NOT_FOUND,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
