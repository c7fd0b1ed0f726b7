//! Command-line surface.

use clap::{Parser, Subcommand};

/// Manage uv and the Python tools it installs.
#[derive(Parser)]
#[command(name = "uvman", version, about, long_about = None)]
pub struct Cli {
    /// Use this database instead of the default location
    #[arg(long, global = true, env = "UVMAN_DB")]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List detected uv installations, newest first
    Installations,

    /// Make the uv binary at PATH the active installation
    Select {
        /// Path of a detected uv binary
        path: String,
    },

    /// Print the directory uv installs tools into
    Dir,

    /// List installed tools
    List {
        /// Only show tools whose name or version contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show details for one installed tool
    Show {
        /// Tool name as reported by `uv tool list`
        name: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Install a tool
    Install {
        /// Package to install
        name: String,
        /// Extra packages to install alongside (comma separated or repeated)
        #[arg(long = "with", value_delimiter = ',')]
        with_packages: Vec<String>,
        /// Reinstall even if already present
        #[arg(short, long)]
        force: bool,
        /// Stream output here instead of handing off to the terminal
        #[arg(long)]
        no_terminal: bool,
    },

    /// Upgrade one tool or all of them
    Upgrade {
        /// Tool to upgrade
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,
        /// Upgrade every installed tool
        #[arg(long)]
        all: bool,
        /// Stream output here instead of handing off to the terminal
        #[arg(long)]
        no_terminal: bool,
    },

    /// Uninstall a tool
    Uninstall {
        /// Tool to remove
        name: String,
    },

    /// Run `uv self update` for the active installation
    SelfUpdate,

    /// Install uv with the official standalone installer
    InstallUv,

    /// Show recently run commands
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Delete the history instead of showing it
        #[arg(long)]
        clear: bool,
    },

    /// Show or change preferences
    Config {
        /// Hand install/upgrade off to the terminal (true) or stream output (false)
        #[arg(long)]
        terminal: Option<bool>,
        /// Also probe this uv binary during detection
        #[arg(long, value_name = "PATH")]
        add_search_path: Option<String>,
        /// Stop probing this uv binary
        #[arg(long, value_name = "PATH")]
        remove_search_path: Option<String>,
    },
}
