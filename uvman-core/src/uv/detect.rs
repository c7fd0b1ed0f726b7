//! Discovery of `uv` binaries on the host.
//!
//! Well-known install locations are checked first, then any user-configured
//! search paths, then whatever `which -a uv` reports. Each candidate that
//! exists is probed with `uv --version`; candidates that fail to answer are
//! logged and skipped.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::commands::UvCommand;
use super::types::Installation;
use crate::parser::{parse_version, sort_installations};
use crate::process::{CommandExecutor, ExecutionMode};

#[cfg(windows)]
const UV_BINARY: &str = "uv.exe";

#[cfg(not(windows))]
const UV_BINARY: &str = "uv";

#[cfg(windows)]
const WHICH: &str = "where";

#[cfg(not(windows))]
const WHICH: &str = "/usr/bin/which";

/// Locations the official installers and package managers put `uv`.
pub fn well_known_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".local").join("bin").join(UV_BINARY));
        paths.push(home.join(".cargo").join("bin").join(UV_BINARY));
    }

    #[cfg(not(windows))]
    {
        paths.push(PathBuf::from("/usr/local/bin/uv"));
        paths.push(PathBuf::from("/opt/homebrew/bin/uv"));
        paths.push(PathBuf::from("/usr/bin/uv"));
    }

    paths
}

/// Well-known paths followed by the extra search paths, without duplicates.
pub fn candidate_paths(extra_search_paths: &[String]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let extras = extra_search_paths.iter().map(PathBuf::from);

    for path in well_known_paths().into_iter().chain(extras) {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    candidates
}

/// Every `uv` on the PATH according to `which -a uv`.
///
/// A missing or failing `which` yields an empty list.
pub async fn which_all(executor: &dyn CommandExecutor) -> Vec<PathBuf> {
    let args = ["-a".to_string(), "uv".to_string()];
    #[cfg(windows)]
    let args = &args[1..];
    #[cfg(not(windows))]
    let args = &args[..];

    match executor
        .execute(Path::new(WHICH), args, ExecutionMode::Captured)
        .await
    {
        Ok(result) => result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(e) => {
            debug!(error = %e, "which lookup for uv failed");
            Vec::new()
        }
    }
}

/// Runs `uv --version` at `path` and parses the banner.
pub async fn probe(executor: &dyn CommandExecutor, path: &Path) -> Option<Installation> {
    let result = match executor
        .execute(path, &UvCommand::Version.args(), ExecutionMode::Captured)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to get uv version");
            return None;
        }
    };

    match parse_version(&result.stdout) {
        Some((version, version_date)) => Some(Installation {
            path: path.to_string_lossy().into_owned(),
            version,
            version_date,
        }),
        None => {
            warn!(
                path = %path.display(),
                output = %result.stdout.trim(),
                "Unrecognized uv version banner"
            );
            None
        }
    }
}

/// Probes each existing candidate and returns the installations newest first.
pub async fn detect_from_candidates(
    executor: &dyn CommandExecutor,
    candidates: &[PathBuf],
) -> Vec<Installation> {
    let mut installations = Vec::new();

    for path in candidates {
        if !path.exists() {
            continue;
        }
        if let Some(installation) = probe(executor, path).await {
            debug!(
                path = %installation.path,
                version = %installation.version,
                "Found uv installation"
            );
            installations.push(installation);
        }
    }

    sort_installations(&mut installations);
    installations
}

/// Discovers all `uv` installations on the host.
pub async fn detect_installations(
    executor: &dyn CommandExecutor,
    extra_search_paths: &[String],
) -> Vec<Installation> {
    let mut candidates = candidate_paths(extra_search_paths);

    for path in which_all(executor).await {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    let installations = detect_from_candidates(executor, &candidates).await;
    info!(count = installations.len(), "uv installation detection complete");
    installations
}
