//! Ranking artifact persistence
//!
//! One `<run_id>_ranking.json` lives in the output directory at a time. Each
//! write replaces whatever ranking was there before.

use crate::domain::{Ranking, RANKING_SUFFIX};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `ranking` to `<output_dir>/<run_id>_ranking.json`, deleting every
/// previous ranking artifact in that directory.
///
/// The document is fully serialized and staged before anything is deleted, so
/// a failed run never leaves a truncated artifact behind.
pub fn write_ranking(ranking: &Ranking, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed creating output directory: {}", output_dir.display()))?;

    let body = serde_json::to_string_pretty(ranking)?;
    let output_file = output_dir.join(format!("{}{RANKING_SUFFIX}", ranking.run_id));
    let staged = output_dir.join(format!(".{}{RANKING_SUFFIX}.tmp", ranking.run_id));
    fs::write(&staged, body)
        .with_context(|| format!("Failed writing ranking: {}", staged.display()))?;

    if let Err(e) = replace_rankings(&staged, &output_file, output_dir) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    Ok(output_file)
}

/// Remove every existing ranking in `output_dir`, then move `staged` into place.
fn replace_rankings(staged: &Path, output_file: &Path, output_dir: &Path) -> Result<()> {
    for old in ranking_files(output_dir)? {
        fs::remove_file(&old)
            .with_context(|| format!("Failed removing old ranking: {}", old.display()))?;
    }
    fs::rename(staged, output_file)
        .with_context(|| format!("Failed writing ranking: {}", output_file.display()))
}

/// Load the current ranking artifact from `output_dir`.
///
/// Normally exactly one exists. If concurrent runs left several, the newest
/// run id wins.
pub fn load_latest_ranking(output_dir: &Path) -> Result<(PathBuf, Ranking)> {
    let mut files = ranking_files(output_dir)?;
    files.sort();
    if files.len() > 1 {
        tracing::warn!(
            "Found {} ranking files in {}; using the newest",
            files.len(),
            output_dir.display()
        );
    }
    let Some(latest) = files.pop() else {
        anyhow::bail!("No ranking files found in {}", output_dir.display());
    };

    let content = fs::read_to_string(&latest)
        .with_context(|| format!("Failed reading ranking: {}", latest.display()))?;
    let ranking: Ranking = serde_json::from_str(&content)
        .with_context(|| format!("Invalid ranking file: {}", latest.display()))?;
    Ok((latest, ranking))
}

/// Recover the run id from an artifact file name, e.g.
/// `output/20250101_120000_ranking.json` -> `20250101_120000`.
pub fn run_id_from_path(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix(RANKING_SUFFIX)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn ranking_files(output_dir: &Path) -> Result<Vec<PathBuf>> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(output_dir)
        .with_context(|| format!("Failed listing output directory: {}", output_dir.display()))?
    {
        let path = entry?.path();
        let is_ranking = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(RANKING_SUFFIX) && !n.starts_with('.'));
        if is_ranking && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
