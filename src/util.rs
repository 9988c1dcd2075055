pub mod diff;

use anyhow::{Context, bail};
use std::process::Command;
use tracing::debug;

/// Represents the base reference for git operations
#[derive(Debug, PartialEq, Eq)]
pub enum Base {
    /// Validate all tracked files in the repository
    Root,
    /// Validate files changed against a specific commit
    Commit(String),
}

impl Base {
    /// Parse a base string into a Base enum
    ///
    /// - Empty string: auto-detect HEAD or ^ based on uncommitted changes
    /// - "ROOT": all files
    /// - "^" or "~": relative to HEAD
    /// - Otherwise: commit hash or reference
    pub fn parse(diff_base: &str) -> Self {
        let base = if diff_base.is_empty() {
            debug!("Base is empty, checking for uncommitted changes");
            let has_uncommitted = Command::new("git")
                .args(["diff", "--quiet", "HEAD"])
                .status()
                .map(|s| !s.success())
                .unwrap_or(false);
            let detected = if has_uncommitted { "HEAD" } else { "^" };
            debug!("Auto-detected base: {}", detected);
            detected
        } else {
            diff_base
        };

        Self::from_ref(base)
    }

    fn from_ref(base: &str) -> Self {
        if base == "ROOT" {
            Self::Root
        } else if base.starts_with('~') || base.starts_with('^') {
            Self::Commit(format!("HEAD{}", base))
        } else {
            Self::Commit(base.to_string())
        }
    }
}

/// List files to consider for validation. Deleted files are left out since
/// there is nothing to load for them.
pub fn get_changed_files(base: &Base) -> anyhow::Result<Vec<String>> {
    let output = match base {
        Base::Root => Command::new("git")
            .args(["ls-files"])
            .output()
            .context("Failed to execute git ls-files")?,
        Base::Commit(commit) => Command::new("git")
            .args(["diff", "--name-only", "--diff-filter=d", commit])
            .output()
            .context("Failed to execute git diff")?,
    };

    if !output.status.success() {
        bail!(
            "git exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect())
}
