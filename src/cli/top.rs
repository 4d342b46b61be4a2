//! Top command implementation

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::render::{load_latest_ranking, run_id_from_path};

#[derive(Args)]
pub struct TopArgs {
    /// Directory holding the ranking artifact
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the top entry as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &TopArgs, config: Option<&Path>, cwd: &Path) -> Result<()> {
    let settings = Settings::load(cwd, config)?;
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => settings.output_path(cwd),
    };

    let (path, ranking) = load_latest_ranking(&output_dir)?;
    let run_id = run_id_from_path(&path).unwrap_or_else(|| ranking.run_id.clone());
    let Some(top) = ranking.top() else {
        anyhow::bail!("Ranking {} has no entries", path.display());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(top)?);
        return Ok(());
    }

    println!("Run ID: {run_id}");
    println!("Test: {}", top.test_path);
    println!("Contract: {}", top.contract_path);
    match (top.staleness_days, top.score) {
        (Some(stale), Some(score)) if stale > 0.0 => {
            println!("Score: {score:.2} (contract changed {stale:.2} days after the test)")
        }
        (_, Some(score)) => println!("Score: {score:.2} (test age in days)"),
        _ => println!("Score: unknown"),
    }

    Ok(())
}
