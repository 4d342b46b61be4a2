//! Ranking assembly: discover, filter, resolve, score and order test entries

use crate::domain::{ExclusionSet, ProjectLayout, Ranking, TestEntry};
use crate::history::CommitHistory;
use crate::resolve::resolve;
use crate::scan::{filter_excluded, find_test_files, ScanStats};
use crate::score::score_pair;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::path::Path;

pub mod pipeline;

pub use pipeline::{run_pipeline, RunOutcome};

/// Score every non-excluded test that resolves to a contract.
///
/// Entries come back in discovery order; tests without a resolvable contract
/// are dropped. `now` (Unix seconds) feeds the age fallback of the scorer.
pub fn collect_entries(
    layout: &ProjectLayout,
    exclusions: &ExclusionSet,
    history: &impl CommitHistory,
    now: i64,
    stats: &mut ScanStats,
) -> Vec<TestEntry> {
    let discovered = find_test_files(&layout.test_root, &layout.test_suffix);
    stats.files_discovered = discovered.len();
    tracing::debug!(
        "Discovered {} test files under {}",
        discovered.len(),
        layout.test_root.display()
    );

    let candidates = filter_excluded(discovered, layout, exclusions, stats);

    let mut entries = Vec::with_capacity(candidates.len());
    for test_file in candidates {
        let Some(contract) = resolve(&test_file, layout) else {
            stats.files_unresolved += 1;
            continue;
        };
        entries.push(create_entry(&test_file, &contract, layout, history, now));
    }
    stats.entries_ranked = entries.len();
    entries
}

fn create_entry(
    test_file: &Path,
    contract: &Path,
    layout: &ProjectLayout,
    history: &impl CommitHistory,
    now: i64,
) -> TestEntry {
    let test_commit_ts = history.last_change(test_file);
    let contract_commit_ts = history.last_change(contract);
    let (staleness_days, score) = score_pair(test_commit_ts, contract_commit_ts, now);

    TestEntry {
        test_path: project_relative(test_file, layout),
        contract_path: project_relative(contract, layout),
        test_commit_ts,
        contract_commit_ts,
        staleness_days,
        score,
    }
}

fn project_relative(path: &Path, layout: &ProjectLayout) -> String {
    layout.relative(path).unwrap_or_else(|| crate::utils::normalize_path(&path.to_string_lossy()))
}

/// Stable sort: known scores first in descending order, then unscored entries
/// in their original order.
pub fn sort_entries(entries: &mut [TestEntry]) {
    entries.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn build_ranking(
    mut entries: Vec<TestEntry>,
    run_id: impl Into<String>,
    generated_at: DateTime<Utc>,
) -> Ranking {
    sort_entries(&mut entries);
    Ranking { run_id: run_id.into(), generated_at, entries }
}
