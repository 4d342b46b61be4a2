//! Ranking artifact output

pub mod ranking;

pub use ranking::{load_latest_ranking, run_id_from_path, write_ranking};
