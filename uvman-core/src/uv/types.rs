//! Domain records derived from `uv` output.
//!
//! All of these are recomputed on every refresh; none are persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A command exposed by a managed tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Executable {
    pub name: String,
    pub path: String,
}

/// A Python CLI application installed by `uv tool install`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedTool {
    pub name: String,
    pub version: String,
    /// Tool environment directory, empty when the listing omitted it.
    pub install_path: String,
    /// Version specifier the tool was installed with, e.g. `>=23,<24`.
    pub required_version_specifier: Option<String>,
    pub extras: Vec<String>,
    pub with_packages: Vec<String>,
    pub executables: Vec<Executable>,
}

impl ManagedTool {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Project page on PyPI.
    pub fn pypi_url(&self) -> String {
        format!("https://pypi.org/project/{}/", self.name)
    }
}

/// One discovered copy of the `uv` binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Installation {
    pub path: String,
    pub version: String,
    /// Build tag from the version banner, e.g. `a1b2c3d 2024-06-20`.
    pub version_date: Option<String>,
}

impl Installation {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.version, self.path)
    }
}

impl fmt::Display for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
