//! test-ranker command-line entry point

use anyhow::Result;

fn main() -> Result<()> {
    test_ranker::cli::run()
}
