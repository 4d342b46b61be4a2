//! Core value types shared by the ranking pipeline

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// File name suffix shared by every ranking artifact.
pub const RANKING_SUFFIX: &str = "_ranking.json";

/// One scored test candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntry {
    pub test_path: String,
    pub contract_path: String,
    pub test_commit_ts: Option<i64>,
    pub contract_commit_ts: Option<i64>,
    pub staleness_days: Option<f64>,
    pub score: Option<f64>,
}

/// The persisted, ordered snapshot produced by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<TestEntry>,
}

impl Ranking {
    /// The entry a downstream collaborator picks up, if any.
    pub fn top(&self) -> Option<&TestEntry> {
        self.entries.first()
    }
}

/// Resolved on-disk locations for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectLayout {
    pub repo_root: PathBuf,
    /// Root that entry paths and exclusions are relative to.
    pub project_root: PathBuf,
    pub test_root: PathBuf,
    pub source_root: PathBuf,
    pub test_suffix: String,
    pub source_extension: String,
}

impl ProjectLayout {
    /// Path relative to the project root, `/`-separated.
    pub fn relative(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.project_root)
            .ok()
            .and_then(|p| p.to_str())
            .map(crate::utils::normalize_path)
    }
}

/// Directories and files skipped during ranking.
///
/// Paths are relative to the project root. Membership is an exact match on
/// `files` or component-wise containment under any of `dirs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionSet {
    pub dirs: Vec<PathBuf>,
    pub files: BTreeSet<PathBuf>,
}

impl ExclusionSet {
    pub fn new(dirs: Vec<PathBuf>, files: BTreeSet<PathBuf>) -> Self {
        Self { dirs, files }
    }

    /// Fold recently processed test paths into the exact-file set.
    pub fn with_recent(mut self, recent: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(recent);
        self
    }

    pub fn contains(&self, path: &Path) -> bool {
        crate::exclude::is_excluded(path, &self.dirs, &self.files)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

/// Record written by the agent session collaborator and uploaded as the
/// `log.json` CI artifact. Only the fields read back here are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionLog {
    #[serde(default)]
    pub selected_files: Option<SelectedFiles>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedFiles {
    pub test_path: Option<String>,
}

impl SessionLog {
    pub fn test_path(&self) -> Option<&str> {
        self.selected_files
            .as_ref()
            .and_then(|s| s.test_path.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

/// Timestamp-derived, lexically sortable run identifier (`YYYYMMDD_HHMMSS`).
pub fn new_run_id(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}
