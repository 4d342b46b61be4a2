//! Rank command implementation

use anyhow::Result;
use chrono::Local;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::rank::run_pipeline;

#[derive(Args, Default)]
pub struct RankArgs {
    /// Git repository root (discovered from the working directory by default)
    #[arg(long, value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Static exclusion file (TOML or YAML)
    #[arg(short = 'e', long, value_name = "FILE")]
    pub exclusions: Option<PathBuf>,

    /// Directory the ranking artifact is written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip the CI lookback for recently processed tests
    #[arg(long)]
    pub no_ci: bool,
}

impl RankArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.repo_root {
            settings.repo_root = Some(root.clone());
        }
        if let Some(file) = &self.exclusions {
            settings.exclusion_file = file.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.no_ci {
            settings.ci.enabled = false;
        }
    }
}

pub fn run(args: &RankArgs, config: Option<&Path>, cwd: &Path) -> Result<()> {
    let mut settings = Settings::load(cwd, config)?;
    args.apply(&mut settings);
    tracing::debug!("Settings: {settings:?}");

    let outcome = run_pipeline(&settings, cwd, Local::now())?;
    let stats = &outcome.stats;

    println!(
        "Generated {} with {} entries",
        outcome.output_file.display(),
        stats.entries_ranked
    );
    println!("Run ID: {}", outcome.run_id);
    println!(
        "Test files: {} discovered, {} excluded, {} without a contract",
        stats.files_discovered, stats.files_excluded, stats.files_unresolved
    );
    if let Some(top) = &outcome.top_test {
        println!("Top entry: {top}");
    }

    Ok(())
}
