//! Version-control history lookups
//!
//! Every lookup is best-effort: a file without history, a path outside the
//! work tree or a failing `git` invocation all yield `None`.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of "last changed" timestamps for files in a repository.
pub trait CommitHistory {
    /// Unix timestamp (seconds) of the last commit touching `file`.
    fn last_change(&self, file: &Path) -> Option<i64>;
}

/// History backed by the `git` CLI, one subprocess per file.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_root: PathBuf,
}

impl GitHistory {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into() }
    }
}

impl CommitHistory for GitHistory {
    fn last_change(&self, file: &Path) -> Option<i64> {
        last_change_timestamp(file, &self.repo_root)
    }
}

/// Timestamp of the most recent commit touching `file_path`.
///
/// Runs `git log -1 --format=%ct -- <path>` from `repo_root`. Relative paths are
/// taken as relative to `repo_root`.
pub fn last_change_timestamp(file_path: &Path, repo_root: &Path) -> Option<i64> {
    let relative = if file_path.is_absolute() {
        match file_path.strip_prefix(repo_root) {
            Ok(rel) => rel,
            Err(_) => {
                tracing::debug!(
                    "{} is outside repository {}",
                    file_path.display(),
                    repo_root.display()
                );
                return None;
            }
        }
    } else {
        file_path
    };

    let output = match Command::new("git")
        .args(["log", "-1", "--format=%ct", "--"])
        .arg(relative)
        .current_dir(repo_root)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("failed to run git for {}: {e}", relative.display());
            return None;
        }
    };

    if !output.status.success() {
        tracing::debug!(
            "git log failed for {}: {}",
            relative.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    parse_commit_timestamp(&String::from_utf8_lossy(&output.stdout))
}

fn parse_commit_timestamp(stdout: &str) -> Option<i64> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Locate the work tree enclosing `start`.
pub fn discover_repo_root(start: &Path) -> Option<PathBuf> {
    let repo = git2::Repository::discover(start).ok()?;
    repo.workdir().map(Path::to_path_buf)
}
