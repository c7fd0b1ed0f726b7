//! uvman command-line front-end.
//!
//! Manages uv installations and the Python tools installed through them.

mod app;
mod commands;

use clap::Parser;

use app::App;
use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("Starting uvman v{}", uvman_core::VERSION);

    let mut app = App::new(cli.db).await?;
    let result = run(&mut app, cli.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &mut App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Installations => {
            app.installations().await;
            Ok(())
        }
        Commands::Select { path } => app.select(&path).await,
        Commands::Dir => app.dir().await,
        Commands::List { filter, json } => app.list(filter.as_deref(), json).await,
        Commands::Show { name, json } => app.show(&name, json).await,
        Commands::Install {
            name,
            with_packages,
            force,
            no_terminal,
        } => app.install(&name, &with_packages, force, no_terminal).await,
        Commands::Upgrade {
            name,
            all: _,
            no_terminal,
        } => app.upgrade(name.as_deref(), no_terminal).await,
        Commands::Uninstall { name } => app.uninstall(&name).await,
        Commands::SelfUpdate => app.self_update().await,
        Commands::InstallUv => app.install_uv().await,
        Commands::History { limit, clear } => app.history(limit, clear),
        Commands::Config {
            terminal,
            add_search_path,
            remove_search_path,
        } => app.config(
            terminal,
            add_search_path.as_deref(),
            remove_search_path.as_deref(),
        ),
    }
}
