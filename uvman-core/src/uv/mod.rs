//! `uv` domain: installations, managed tools and the manager that drives them.

pub mod commands;
pub mod detect;
pub mod manager;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use commands::UvCommand;
pub use detect::detect_installations;
pub use manager::{UvManager, UV_INSTALL_SCRIPT, UV_NOT_FOUND};
pub use types::{Executable, Installation, ManagedTool};
