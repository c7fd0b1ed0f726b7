//! High-level manager for a host's `uv` installations and tools.
//!
//! `UvManager` is what the presentation layer talks to. It owns the live
//! installation and tool lists and drives every `uv` invocation through a
//! [`CommandExecutor`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::commands::UvCommand;
use super::detect;
use super::types::{Installation, ManagedTool};
use crate::config::Settings;
use crate::parser::parse_tool_listing;
use crate::process::{CommandExecutor, CommandResult, ExecutionMode, ExecutionStrategy, ProcessError};

/// Shown when detection finds no `uv` binary.
pub const UV_NOT_FOUND: &str = "UV not found. Please install UV first.";

/// Official standalone installer.
pub const UV_INSTALL_SCRIPT: &str = "curl -LsSf https://astral.sh/uv/install.sh | sh";

#[cfg(not(windows))]
const SHELL: &str = "/bin/sh";

#[cfg(windows)]
const SHELL: &str = "sh";

/// Manages `uv` installations and the tools installed through them.
pub struct UvManager {
    executor: Arc<dyn CommandExecutor>,
    installations: Vec<Installation>,
    selected: Option<Installation>,
    /// Persisted choice, applied when it is among the detected installations.
    preferred_path: Option<String>,
    extra_search_paths: Vec<String>,
    tools: Vec<ManagedTool>,
    tools_directory: String,
    last_error: Option<String>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl UvManager {
    /// Creates a manager with nothing detected yet.
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            installations: Vec::new(),
            selected: None,
            preferred_path: None,
            extra_search_paths: Vec::new(),
            tools: Vec::new(),
            tools_directory: String::new(),
            last_error: None,
            last_refreshed: None,
        }
    }

    /// Creates a manager honouring the persisted installation choice and
    /// search paths.
    pub fn with_settings(executor: Arc<dyn CommandExecutor>, settings: &Settings) -> Self {
        let mut manager = Self::new(executor);
        manager.preferred_path = settings.selected_installation.clone();
        manager.extra_search_paths = settings.extra_search_paths.clone();
        manager
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }

    pub fn selected_installation(&self) -> Option<&Installation> {
        self.selected.as_ref()
    }

    pub fn tools(&self) -> &[ManagedTool] {
        &self.tools
    }

    /// Looks a tool up in the current list.
    ///
    /// Detail views call this on every render so they always reflect the
    /// latest refresh rather than a snapshot.
    pub fn tool(&self, name: &str) -> Option<&ManagedTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tools whose name or version contains `query`, ignoring case.
    ///
    /// A blank query matches every tool.
    pub fn filter_tools(&self, query: &str) -> Vec<&ManagedTool> {
        let query = query.trim().to_lowercase();
        self.tools
            .iter()
            .filter(|t| {
                query.is_empty()
                    || t.name.to_lowercase().contains(&query)
                    || t.version.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn tools_directory(&self) -> &str {
        &self.tools_directory
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    fn active_path(&self) -> Result<PathBuf, ProcessError> {
        self.selected
            .as_ref()
            .map(|i| PathBuf::from(&i.path))
            .ok_or(ProcessError::NoInstallation)
    }

    fn record_error(&mut self, context: &str, e: &ProcessError) {
        error!(error = %e, "{}", context);
        self.last_error = Some(e.to_string());
    }

    // ========================================================================
    // Installations
    // ========================================================================

    /// Re-detects installations and keeps a valid selection.
    pub async fn detect_installations(&mut self) {
        let installations =
            detect::detect_installations(self.executor.as_ref(), &self.extra_search_paths).await;
        self.apply_installations(installations);
    }

    /// Replaces the installation list, which must already be sorted.
    ///
    /// The current selection survives if it is still present; otherwise the
    /// persisted preference wins, then the newest installation.
    fn apply_installations(&mut self, installations: Vec<Installation>) {
        self.installations = installations;

        let keep = |path: Option<&str>| {
            path.and_then(|p| self.installations.iter().find(|i| i.path == p))
                .cloned()
        };

        let selected = keep(self.selected.as_ref().map(|i| i.path.as_str()))
            .or_else(|| keep(self.preferred_path.as_deref()))
            .or_else(|| self.installations.first().cloned());

        if selected.is_none() {
            warn!("No uv installation found");
            self.last_error = Some(UV_NOT_FOUND.to_string());
        } else if self.last_error.as_deref() == Some(UV_NOT_FOUND) {
            self.last_error = None;
        }

        if let Some(ref installation) = selected {
            info!(
                path = %installation.path,
                version = %installation.version,
                "Using uv installation"
            );
        }
        self.selected = selected;
    }

    /// Makes the installation at `path` active.
    pub fn select_installation(&mut self, path: &str) -> Result<&Installation, ProcessError> {
        let installation = self
            .installations
            .iter()
            .find(|i| i.path == path)
            .cloned()
            .ok_or(ProcessError::NoInstallation)?;

        if self.selected.as_ref() != Some(&installation) {
            info!(path = %installation.path, "Switching uv installation");
            self.tools.clear();
            self.tools_directory.clear();
        }
        self.preferred_path = Some(installation.path.clone());
        Ok(&*self.selected.insert(installation))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fetches the tools directory. Failures land in `last_error`.
    pub async fn fetch_tools_directory(&mut self) {
        let Ok(path) = self.active_path() else {
            return;
        };

        match self
            .executor
            .execute(&path, &UvCommand::ToolDir.args(), ExecutionMode::Captured)
            .await
        {
            Ok(result) => {
                self.tools_directory = result.stdout.trim().to_string();
                debug!(dir = %self.tools_directory, "Fetched tools directory");
            }
            Err(e) => self.record_error("Failed to fetch tools directory", &e),
        }
    }

    /// Re-lists installed tools. Failures land in `last_error` and keep the
    /// previous list.
    pub async fn fetch_tools(&mut self) {
        let Ok(path) = self.active_path() else {
            return;
        };

        match self
            .executor
            .execute(&path, &UvCommand::ToolList.args(), ExecutionMode::Captured)
            .await
        {
            Ok(result) => {
                self.tools = parse_tool_listing(&result.stdout);
                self.last_refreshed = Some(Utc::now());
                info!(count = self.tools.len(), "Fetched installed tools");
            }
            Err(e) => self.record_error("Failed to fetch tools", &e),
        }
    }

    /// Detection, tools directory and tool list in one go.
    pub async fn refresh(&mut self) {
        self.detect_installations().await;
        self.fetch_tools_directory().await;
        self.fetch_tools().await;
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Runs a mutating command with the given strategy.
    ///
    /// Interactive commands are queued for the terminal surface and return
    /// `None`; the caller refreshes once the terminal is closed. Captured and
    /// streamed commands run to completion and refresh the tool list.
    async fn run_mutation(
        &mut self,
        command: UvCommand,
        strategy: ExecutionStrategy,
    ) -> Result<Option<CommandResult>, ProcessError> {
        let path = self.active_path()?;
        info!(%command, %strategy, "Running uv command");

        match strategy.mode() {
            None => {
                self.executor.run_in_terminal(&path, command.args());
                Ok(None)
            }
            Some(mode) => {
                let result = self.executor.execute(&path, &command.args(), mode).await?;
                self.fetch_tools().await;
                Ok(Some(result))
            }
        }
    }

    /// `uv tool install <name> [--with a,b] [--force]`
    pub async fn install_tool(
        &mut self,
        name: &str,
        with_packages: &[String],
        force: bool,
        strategy: ExecutionStrategy,
    ) -> Result<Option<CommandResult>, ProcessError> {
        let command = UvCommand::Install {
            name: name.to_string(),
            with_packages: with_packages.to_vec(),
            force,
        };
        self.run_mutation(command, strategy).await
    }

    /// `uv tool upgrade <name>`
    pub async fn upgrade_tool(
        &mut self,
        name: &str,
        strategy: ExecutionStrategy,
    ) -> Result<Option<CommandResult>, ProcessError> {
        let command = UvCommand::Upgrade {
            name: name.to_string(),
        };
        self.run_mutation(command, strategy).await
    }

    /// `uv tool upgrade --all`
    pub async fn upgrade_all(
        &mut self,
        strategy: ExecutionStrategy,
    ) -> Result<Option<CommandResult>, ProcessError> {
        self.run_mutation(UvCommand::UpgradeAll, strategy).await
    }

    /// `uv tool uninstall <name>`, always streamed.
    pub async fn uninstall_tool(&mut self, name: &str) -> Result<CommandResult, ProcessError> {
        let command = UvCommand::Uninstall {
            name: name.to_string(),
        };
        let result = self
            .run_mutation(command, ExecutionStrategy::Streamed)
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Queues `uv self update` for the terminal.
    ///
    /// Re-run [`detect_installations`](Self::detect_installations) once the
    /// terminal closes to pick up the new version.
    pub fn self_update(&mut self) -> Result<(), ProcessError> {
        let path = match self.active_path() {
            Ok(path) => path,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        info!(path = %path.display(), "Queueing uv self update");
        self.executor
            .run_in_terminal(&path, UvCommand::SelfUpdate.args());
        Ok(())
    }

    /// Installs `uv` with the official script, then re-detects.
    pub async fn install_uv(&mut self) -> Result<CommandResult, ProcessError> {
        info!("Installing uv with the standalone installer");
        let args = vec!["-c".to_string(), UV_INSTALL_SCRIPT.to_string()];
        let result = self
            .executor
            .execute(Path::new(SHELL), &args, ExecutionMode::Streamed)
            .await?;
        self.detect_installations().await;
        Ok(result)
    }
}
