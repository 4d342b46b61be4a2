//! test-ranker: find the contract tests that most urgently need review
//!
//! A test is stale when the contract it exercises changed after the test did.
//! Each run discovers test files, skips excluded and recently handled ones,
//! pairs every test with its contract by naming convention, scores the pair
//! from git history and writes a single ordered ranking artifact.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exclude;
pub mod history;
pub mod rank;
pub mod render;
pub mod resolve;
pub mod scan;
pub mod score;
pub mod utils;
