//! SQLite storage for uvman.
//!
//! Holds the persisted settings blob and a log of the mutating `uv`
//! commands run from the front-end.

mod migrations;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of the command log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: i64,
    /// Display form, e.g. `uv tool upgrade ruff -v --color never`.
    pub command: String,
    /// `None` when the run was interrupted or handed to a terminal.
    pub exit_code: Option<i32>,
    /// Unix seconds.
    pub ran_at: i64,
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Opens the database at [`default_path`](Self::default_path).
    pub fn open() -> anyhow::Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Opens (or creates) the database at `path`, creating parent
    /// directories. The file is made owner-only on Unix.
    pub fn open_at(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            {
                tracing::warn!(path = %path.display(), error = %e, "Failed to set database file permissions");
            }
        }

        Ok(Self { conn, path })
    }

    /// `~/.local/share/uvman/uvman.db` or the platform equivalent.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join("uvman").join("uvman.db"))
    }

    /// Safe to call on every start.
    pub fn migrate(&self) -> anyhow::Result<()> {
        migrations::run_migrations(&self.conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    // =========================================================================
    // Settings Storage
    // =========================================================================

    /// Upserts a setting.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, unixepoch())
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
    }

    /// Returns `default` when the setting is missing or unreadable.
    pub fn get_setting_or(&self, key: &str, default: &str) -> String {
        self.get_setting(key)
            .ok()
            .flatten()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn delete_setting(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }

    // =========================================================================
    // Command History
    // =========================================================================

    /// Appends a command to the log and returns its row id.
    pub fn record_command(
        &self,
        command: &str,
        exit_code: Option<i32>,
    ) -> Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO command_history (command, exit_code) VALUES (?, ?)",
            params![command, exit_code],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Newest first.
    pub fn recent_commands(&self, limit: usize) -> Result<Vec<CommandRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, command, exit_code, ran_at FROM command_history
             ORDER BY ran_at DESC, id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok(CommandRecord {
                id: row.get(0)?,
                command: row.get(1)?,
                exit_code: row.get(2)?,
                ran_at: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    /// Empties the log, returning how many rows were removed.
    pub fn clear_history(&self) -> Result<usize, rusqlite::Error> {
        self.conn.execute("DELETE FROM command_history", [])
    }
}

// =============================================================================
// Tests
// =============================================================================
