//! User preferences, persisted to the database as JSON.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::process::ExecutionStrategy;

/// Database key the settings blob lives under.
const SETTINGS_KEY: &str = "settings";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the `uv` binary the user picked, if any.
    pub selected_installation: Option<String>,

    /// Run install/upgrade in the user's terminal instead of streaming
    /// output back.
    pub use_terminal: bool,

    /// Extra `uv` binaries to probe besides the well-known locations.
    pub extra_search_paths: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_installation: None,
            use_terminal: true,
            extra_search_paths: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads settings, falling back to defaults when missing or unparseable.
    pub fn load(db: &Database) -> Self {
        let mut settings = match db.get_setting(SETTINGS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read settings, using defaults");
                Self::default()
            }
        };

        settings.validate();
        settings
    }

    pub fn save(&self, db: &Database) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        db.set_setting(SETTINGS_KEY, &json)
            .context("Failed to save settings")?;
        Ok(())
    }

    /// Drops blank and duplicate search paths and an empty selection.
    pub fn validate(&mut self) {
        let mut seen = Vec::with_capacity(self.extra_search_paths.len());
        for path in self.extra_search_paths.drain(..) {
            let path = path.trim().to_string();
            if !path.is_empty() && !seen.contains(&path) {
                seen.push(path);
            }
        }
        self.extra_search_paths = seen;

        if self
            .selected_installation
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            self.selected_installation = None;
        }
    }

    /// Strategy for install and upgrade.
    pub fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::from_terminal_preference(self.use_terminal)
    }

    /// Returns false when the path was already present.
    pub fn add_search_path(&mut self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() || self.extra_search_paths.iter().any(|p| p == path) {
            return false;
        }
        self.extra_search_paths.push(path.to_string());
        true
    }

    /// Returns false when the path was not present.
    pub fn remove_search_path(&mut self, path: &str) -> bool {
        let before = self.extra_search_paths.len();
        self.extra_search_paths.retain(|p| p != path.trim());
        self.extra_search_paths.len() != before
    }
}

// =============================================================================
// Tests
// =============================================================================
