//! Static exclusion file loading

use crate::domain::ExclusionSet;
use crate::error::ConfigError;
use crate::utils::normalize_entry;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
struct ExclusionFile {
    #[serde(default)]
    exclusions: ExclusionTable,
}

#[derive(Debug, Default, Deserialize)]
struct ExclusionTable {
    #[serde(default)]
    directories: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
}

/// Load the human-curated exclusion list.
///
/// Unlike settings discovery, every failure here is fatal: a missing or
/// malformed exclusion file means the run would rank tests that were meant to
/// be skipped.
pub fn load_static(config_path: &Path) -> Result<ExclusionSet, ConfigError> {
    let content = fs::read_to_string(config_path)
        .map_err(|source| ConfigError::Read { path: config_path.to_path_buf(), source })?;

    let ext =
        config_path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml(&content, config_path)?,
        "yaml" | "yml" => parse_yaml(&content, config_path)?,
        other => {
            return Err(ConfigError::UnsupportedExtension {
                extension: other.to_string(),
                path: config_path.to_path_buf(),
            })
        }
    };

    let dirs: Vec<PathBuf> =
        parsed.exclusions.directories.iter().filter_map(|d| normalize_entry(d)).collect();
    let files: BTreeSet<PathBuf> =
        parsed.exclusions.files.iter().filter_map(|f| normalize_entry(f)).collect();

    tracing::debug!(
        "Loaded {} excluded directories and {} excluded files from {}",
        dirs.len(),
        files.len(),
        config_path.display()
    );

    Ok(ExclusionSet::new(dirs, files))
}

fn parse_toml(content: &str, config_path: &Path) -> Result<ExclusionFile, ConfigError> {
    toml::from_str(content)
        .map_err(|e| ConfigError::Parse { path: config_path.to_path_buf(), message: e.to_string() })
}

fn parse_yaml(content: &str, config_path: &Path) -> Result<ExclusionFile, ConfigError> {
    // An empty YAML document deserializes to unit, not a map.
    if content.trim().is_empty() {
        return Ok(ExclusionFile::default());
    }
    serde_yaml::from_str(content)
        .map_err(|e| ConfigError::Parse { path: config_path.to_path_buf(), message: e.to_string() })
}
