//! Command-line interface for test-ranker
//!
//! Running without a subcommand performs a full ranking pass. `top` reads the
//! current ranking back for downstream tooling.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod rank;
mod top;

/// Rank contract tests by how far they lag behind the contracts they exercise
#[derive(Parser)]
#[command(name = "test-ranker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    rank: rank::RankArgs,

    /// Settings file (defaults to ./test-ranker.toml when present)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank test files and write a fresh ranking artifact (the default)
    Rank(rank::RankArgs),

    /// Show the top-ranked entry of the current ranking artifact
    Top(top::TopArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    // INFO by default so CI lookback diagnostics show up in job logs.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let cwd = std::env::current_dir().context("Failed resolving working directory")?;
    let config = cli.config.as_deref();

    let result = match cli.command {
        None => rank::run(&cli.rank, config, &cwd),
        Some(Commands::Rank(args)) => rank::run(&args, config, &cwd),
        Some(Commands::Top(args)) => top::run(&args, config, &cwd),
    };

    if let Err(e) = &result {
        tracing::error!("Error generating test ranking: {e:#}");
    }
    result
}
