//! Test file discovery

use crate::domain::{ExclusionSet, ProjectLayout};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counters reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_discovered: usize,
    pub files_excluded: usize,
    pub files_unresolved: usize,
    pub entries_ranked: usize,
}

/// Every file under `test_root` whose name ends with `suffix`, in lexical
/// (component-wise) path order. A missing test root yields nothing.
pub fn find_test_files(test_root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(test_root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::debug!("Skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| name.ends_with(suffix)))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Drop test files covered by `exclusions`; paths are matched relative to the
/// project root. Discovery order is preserved.
pub fn filter_excluded(
    test_files: Vec<PathBuf>,
    layout: &ProjectLayout,
    exclusions: &ExclusionSet,
    stats: &mut ScanStats,
) -> Vec<PathBuf> {
    test_files
        .into_iter()
        .filter(|file| {
            let relative = file.strip_prefix(&layout.project_root).unwrap_or(file);
            let excluded = exclusions.contains(relative);
            if excluded {
                tracing::debug!("Excluded {}", relative.display());
                stats.files_excluded += 1;
            }
            !excluded
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "contract T {}").unwrap();
    }

    #[test]
    fn test_finds_only_suffixed_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "test/universal/Proxy.t.sol");
        touch(root, "test/L1/OptimismPortal.t.sol");
        touch(root, "test/L1/SystemConfig.t.sol");
        touch(root, "test/setup/Setup.sol");
        touch(root, "test/Bridge.t.sol");

        let files = find_test_files(&root.join("test"), ".t.sol");
        let rel: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(
            rel,
            vec![
                "test/Bridge.t.sol",
                "test/L1/OptimismPortal.t.sol",
                "test/L1/SystemConfig.t.sol",
                "test/universal/Proxy.t.sol",
            ]
        );
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_test_files(&temp_dir.path().join("test"), ".t.sol").is_empty());
    }

    #[test]
    fn test_filter_excluded_uses_project_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "test/legacy/Old.t.sol");
        touch(root, "test/legacy/sub/Older.t.sol");
        touch(root, "test/legacy2/Kept.t.sol");
        touch(root, "test/Skip.t.sol");
        touch(root, "test/Keep.t.sol");

        let layout = ProjectLayout {
            repo_root: root.to_path_buf(),
            project_root: root.to_path_buf(),
            test_root: root.join("test"),
            source_root: root.join("src"),
            test_suffix: ".t.sol".to_string(),
            source_extension: ".sol".to_string(),
        };
        let exclusions = ExclusionSet::new(
            vec![PathBuf::from("test/legacy")],
            BTreeSet::from([PathBuf::from("test/Skip.t.sol")]),
        );

        let mut stats = ScanStats::default();
        let kept = filter_excluded(
            find_test_files(&layout.test_root, ".t.sol"),
            &layout,
            &exclusions,
            &mut stats,
        );

        assert_eq!(kept, vec![root.join("test/Keep.t.sol"), root.join("test/legacy2/Kept.t.sol")]);
        assert_eq!(stats.files_excluded, 3);
    }
}
