//! Exclusion registry
//!
//! Combines the static exclusion file with test paths that recent CI runs
//! already handed off, so the same stale test is not selected again before its
//! fix lands.

use crate::config::{load_static, Settings};
use crate::domain::ExclusionSet;
use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub mod circleci;

pub use circleci::fetch_recent_history;

/// `true` when `path` is listed exactly in `files` or sits anywhere below one
/// of `dirs`. Containment is component-wise: `test/legacy` covers
/// `test/legacy/sub/A.t.sol` but not `test/legacy2/A.t.sol`.
pub fn is_excluded(path: &Path, dirs: &[PathBuf], files: &BTreeSet<PathBuf>) -> bool {
    files.contains(path) || dirs.iter().any(|dir| path.starts_with(dir))
}

/// Build the exclusion set for one run.
///
/// The static file is mandatory; the CI lookback only ever adds entries and
/// silently contributes nothing when unavailable.
pub fn build_exclusions(
    settings: &Settings,
    exclusion_file: &Path,
    now: DateTime<Utc>,
) -> Result<ExclusionSet, ConfigError> {
    let exclusions = load_static(exclusion_file)?;
    let recent = fetch_recent_history(&settings.ci, now);
    if !recent.is_empty() {
        tracing::info!("Excluded {} recently processed file(s)", recent.len());
    }
    Ok(exclusions.with_recent(recent))
}
