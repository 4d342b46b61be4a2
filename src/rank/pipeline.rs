//! One full discovery -> rank -> write pass

use crate::config::Settings;
use crate::domain::new_run_id;
use crate::exclude::build_exclusions;
use crate::history::GitHistory;
use crate::rank::{build_ranking, collect_entries};
use crate::render::write_ranking;
use crate::scan::ScanStats;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub output_file: PathBuf,
    pub stats: ScanStats,
    pub top_test: Option<String>,
}

/// Run the whole pipeline with `now` as the single clock reading for the run.
///
/// Relative settings paths are anchored at `cwd`. Only a broken exclusion file
/// or an unwritable output directory fails the run; every missing signal along
/// the way degrades to an unscored or skipped entry.
pub fn run_pipeline(settings: &Settings, cwd: &Path, now: DateTime<Local>) -> Result<RunOutcome> {
    let run_id = new_run_id(now);
    let generated_at = now.with_timezone(&Utc);
    tracing::info!("Starting ranking run: {run_id}");

    let layout = settings.layout(cwd);
    let exclusion_file = settings.exclusion_path(cwd);
    let exclusions = build_exclusions(settings, &exclusion_file, generated_at)
        .context("Failed loading exclusions")?;

    let history = GitHistory::new(&layout.repo_root);
    let mut stats = ScanStats::default();
    let entries = collect_entries(&layout, &exclusions, &history, now.timestamp(), &mut stats);

    let ranking = build_ranking(entries, run_id.clone(), generated_at);
    let top_test = ranking.top().map(|e| e.test_path.clone());
    let output_file = write_ranking(&ranking, &settings.output_path(cwd))?;

    Ok(RunOutcome { run_id, output_file, stats, top_test })
}
