//! Application state for one `uvman` invocation.
//!
//! Owns the database, the loaded settings, the process runner and the
//! manager, and implements each subcommand on top of them.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use uvman_core::{
    drain_pending, event_channel, CommandResult, Database, EventReceiver, ExecutionStrategy,
    ManagedTool, ProcessError, ProcessRunner, RunnerEvent, Settings, UvCommand, UvManager,
};

pub struct App {
    db: Database,
    settings: Settings,
    runner: ProcessRunner,
    manager: UvManager,
    /// Set once installations have been detected.
    detected: bool,
    printer: JoinHandle<()>,
}

impl App {
    /// Opens the database and loads settings. Installations are detected on
    /// first use.
    pub async fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let db = match db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::open()?,
        };
        db.migrate().context("Failed to migrate database")?;

        let settings = Settings::load(&db);
        tracing::debug!(?settings, "Loaded settings");

        let (tx, rx) = event_channel();
        let runner = ProcessRunner::with_events(tx);
        let printer = tokio::spawn(async move {
            print_events(rx, std::io::stdout(), std::io::stderr()).await;
        });

        let manager = UvManager::with_settings(Arc::new(runner.clone()), &settings);

        Ok(Self {
            db,
            settings,
            runner,
            manager,
            detected: false,
            printer,
        })
    }

    /// Closes the event channel and waits for the printer to flush what is
    /// still queued.
    pub async fn shutdown(self) {
        self.runner.set_event_sender(None);
        if let Err(e) = self.printer.await {
            tracing::warn!(error = %e, "Output printer failed");
        }
    }

    async fn ensure_detected(&mut self) {
        if !self.detected {
            self.manager.detect_installations().await;
            self.detected = true;
        }
    }

    async fn require_installation(&mut self) -> Result<()> {
        self.ensure_detected().await;
        if self.manager.selected_installation().is_none() {
            bail!(
                "{}",
                self.manager
                    .last_error()
                    .unwrap_or("UV installation not found")
            );
        }
        Ok(())
    }

    /// Fails with the manager's last error, if a refresh recorded one.
    fn check_refresh(&mut self) -> Result<()> {
        match self.manager.last_error() {
            Some(e) => {
                let e = e.to_string();
                self.manager.clear_error();
                bail!(e)
            }
            None => Ok(()),
        }
    }

    fn record(&self, command: &UvCommand, exit_code: Option<i32>) {
        if let Err(e) = self.db.record_command(&command.to_string(), exit_code) {
            tracing::warn!(error = %e, "Failed to record command history");
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn installations(&mut self) {
        self.ensure_detected().await;
        let installations = self.manager.installations();
        if installations.is_empty() {
            println!("No uv installation found.");
            println!("Use 'uvman install-uv' to install it.");
            return;
        }

        let active = self.manager.selected_installation().map(|i| i.path.as_str());
        for installation in installations {
            let marker = if Some(installation.path.as_str()) == active {
                "*"
            } else {
                " "
            };
            match &installation.version_date {
                Some(date) => println!("{marker} {installation} ({date})"),
                None => println!("{marker} {installation}"),
            }
        }
    }

    pub async fn select(&mut self, path: &str) -> Result<()> {
        self.ensure_detected().await;
        let installation = self
            .manager
            .select_installation(path)
            .with_context(|| format!("{path} is not a detected uv installation"))?
            .clone();

        self.settings.selected_installation = Some(installation.path.clone());
        self.settings.save(&self.db)?;
        println!("Using {installation}");
        Ok(())
    }

    pub async fn dir(&mut self) -> Result<()> {
        self.require_installation().await?;
        self.manager.fetch_tools_directory().await;
        self.check_refresh()?;
        println!("{}", self.manager.tools_directory());
        Ok(())
    }

    pub async fn list(&mut self, filter: Option<&str>, json: bool) -> Result<()> {
        self.require_installation().await?;
        self.manager.fetch_tools().await;
        self.check_refresh()?;

        let tools = self.manager.filter_tools(filter.unwrap_or_default());
        if json {
            println!("{}", serde_json::to_string_pretty(&tools)?);
            return Ok(());
        }

        if tools.is_empty() {
            match filter {
                Some(query) if !self.manager.tools().is_empty() => {
                    println!("No installed tool matches '{query}'.")
                }
                _ => println!("No tools installed."),
            }
            return Ok(());
        }

        println!("{:<28} {:<14} Executables", "Name", "Version");
        println!("{}", "-".repeat(72));
        for tool in tools {
            let executables: Vec<&str> = tool.executables.iter().map(|e| e.name.as_str()).collect();
            println!(
                "{:<28} {:<14} {}",
                tool.name,
                tool.version,
                executables.join(", ")
            );
        }
        Ok(())
    }

    pub async fn show(&mut self, name: &str, json: bool) -> Result<()> {
        self.require_installation().await?;
        self.manager.fetch_tools().await;
        self.check_refresh()?;

        let Some(tool) = self.manager.tool(name) else {
            bail!("{name} is not installed");
        };

        if json {
            println!("{}", serde_json::to_string_pretty(tool)?);
        } else {
            print_tool(tool);
        }
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn strategy(&self, no_terminal: bool) -> ExecutionStrategy {
        if no_terminal {
            ExecutionStrategy::Streamed
        } else {
            self.settings.strategy()
        }
    }

    /// Runs the queued terminal command, if any, then refreshes the tools.
    async fn finish_mutation(
        &mut self,
        command: UvCommand,
        outcome: Result<Option<CommandResult>, ProcessError>,
    ) -> Result<()> {
        let exit_code = match outcome {
            Ok(Some(result)) => Some(result.exit_code),
            Ok(None) => {
                let code = drain_pending(&self.runner).await;
                self.manager.fetch_tools().await;
                match code {
                    Ok(code) => code,
                    Err(e) => {
                        self.record(&command, None);
                        return Err(e.into());
                    }
                }
            }
            Err(e) => {
                self.record(&command, e.exit_code());
                return Err(e.into());
            }
        };

        self.record(&command, exit_code);
        match exit_code {
            Some(0) | None => Ok(()),
            Some(code) => bail!("{command} exited with code {code}"),
        }
    }

    pub async fn install(
        &mut self,
        name: &str,
        with_packages: &[String],
        force: bool,
        no_terminal: bool,
    ) -> Result<()> {
        self.require_installation().await?;
        let strategy = self.strategy(no_terminal);
        let command = UvCommand::Install {
            name: name.to_string(),
            with_packages: with_packages.to_vec(),
            force,
        };

        let outcome = with_interrupt(self.runner.clone(), async {
            self.manager
                .install_tool(name, with_packages, force, strategy)
                .await
        })
        .await;
        self.finish_mutation(command, outcome).await
    }

    pub async fn upgrade(&mut self, name: Option<&str>, no_terminal: bool) -> Result<()> {
        self.require_installation().await?;
        let strategy = self.strategy(no_terminal);

        let (command, outcome) = match name {
            Some(name) => {
                let command = UvCommand::Upgrade {
                    name: name.to_string(),
                };
                let outcome = with_interrupt(self.runner.clone(), async {
                    self.manager.upgrade_tool(name, strategy).await
                })
                .await;
                (command, outcome)
            }
            None => {
                let outcome = with_interrupt(self.runner.clone(), async {
                    self.manager.upgrade_all(strategy).await
                })
                .await;
                (UvCommand::UpgradeAll, outcome)
            }
        };
        self.finish_mutation(command, outcome).await
    }

    pub async fn uninstall(&mut self, name: &str) -> Result<()> {
        self.require_installation().await?;
        let command = UvCommand::Uninstall {
            name: name.to_string(),
        };
        let outcome = with_interrupt(self.runner.clone(), async {
            self.manager.uninstall_tool(name).await
        })
        .await
        .map(Some);
        self.finish_mutation(command, outcome).await
    }

    pub async fn self_update(&mut self) -> Result<()> {
        self.ensure_detected().await;
        self.manager.self_update()?;

        let code = drain_pending(&self.runner).await;
        self.record(&UvCommand::SelfUpdate, code.as_ref().ok().copied().flatten());
        let code = code?;

        self.manager.detect_installations().await;
        if let Some(installation) = self.manager.selected_installation() {
            println!("Now using {installation}");
        }
        match code {
            Some(0) | None => Ok(()),
            Some(code) => bail!("uv self update exited with code {code}"),
        }
    }

    pub async fn install_uv(&mut self) -> Result<()> {
        let result = with_interrupt(self.runner.clone(), async { self.manager.install_uv().await })
            .await
            .context("uv installer failed")?;
        self.detected = true;

        match self.manager.selected_installation() {
            Some(installation) => println!("Installed {installation}"),
            None if result.success() => {
                println!("Installer finished but uv was not found in the usual locations.");
                println!("Add its directory with 'uvman config --add-search-path <PATH>'.");
            }
            None => bail!("uv installer exited with code {}", result.exit_code),
        }
        Ok(())
    }

    // =========================================================================
    // History & Config
    // =========================================================================

    pub fn history(&self, limit: usize, clear: bool) -> Result<()> {
        if clear {
            let removed = self.db.clear_history()?;
            println!("Removed {removed} entries.");
            return Ok(());
        }

        let records = self.db.recent_commands(limit)?;
        if records.is_empty() {
            println!("No commands recorded yet.");
            return Ok(());
        }

        for record in records {
            let when = chrono::DateTime::from_timestamp(record.ran_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "--".to_string());
            let code = record
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{when}  [{code:>3}]  {}", record.command);
        }
        Ok(())
    }

    pub fn config(
        &mut self,
        terminal: Option<bool>,
        add_search_path: Option<&str>,
        remove_search_path: Option<&str>,
    ) -> Result<()> {
        let mut changed = false;

        if let Some(use_terminal) = terminal {
            changed |= self.settings.use_terminal != use_terminal;
            self.settings.use_terminal = use_terminal;
        }
        if let Some(path) = add_search_path {
            changed |= self.settings.add_search_path(path);
        }
        if let Some(path) = remove_search_path {
            if !self.settings.remove_search_path(path) {
                bail!("{path} is not a configured search path");
            }
            changed = true;
        }

        if changed {
            self.settings.validate();
            self.settings.save(&self.db)?;
        }

        println!("Database:            {}", self.db.path().display());
        println!(
            "Active installation: {}",
            self.settings
                .selected_installation
                .as_deref()
                .unwrap_or("(newest detected)")
        );
        println!("Install/upgrade:     {}", self.settings.strategy());
        if self.settings.extra_search_paths.is_empty() {
            println!("Extra search paths:  (none)");
        } else {
            println!("Extra search paths:");
            for path in &self.settings.extra_search_paths {
                println!("  {path}");
            }
        }
        Ok(())
    }
}

/// Echoes streamed process output as it arrives, until every sender is gone.
async fn print_events<O: Write, E: Write>(mut rx: EventReceiver, mut out: O, mut err: E) {
    while let Some(event) = rx.recv().await {
        match event {
            RunnerEvent::Started { command } => tracing::debug!(%command, "Process started"),
            RunnerEvent::Stdout(text) => {
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            RunnerEvent::Stderr(text) => {
                let _ = err.write_all(text.as_bytes());
                let _ = err.flush();
            }
            RunnerEvent::Finished { exit_code } => {
                tracing::debug!(?exit_code, "Process finished")
            }
        }
    }
}

/// Awaits `fut`, cancelling the runner's process on Ctrl-C.
async fn with_interrupt<F: std::future::Future>(runner: ProcessRunner, fut: F) -> F::Output {
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping process");
            runner.cancel();
        }
    });

    let output = fut.await;
    watcher.abort();
    output
}

fn print_tool(tool: &ManagedTool) {
    println!("{} {}", tool.name, tool.version);
    if let Some(ref spec) = tool.required_version_specifier {
        println!("  Requirement:  {spec}");
    }
    if !tool.install_path.is_empty() {
        println!("  Installed in: {}", tool.install_path);
    }
    if !tool.extras.is_empty() {
        println!("  Extras:       {}", tool.extras.join(", "));
    }
    if !tool.with_packages.is_empty() {
        println!("  With:         {}", tool.with_packages.join(", "));
    }
    println!("  PyPI:         {}", tool.pypi_url());
    if !tool.executables.is_empty() {
        println!("  Executables:");
        for executable in &tool.executables {
            println!("    {} ({})", executable.name, executable.path);
        }
    }
}
