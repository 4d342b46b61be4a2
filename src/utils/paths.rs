//! Path normalization

use std::path::PathBuf;

/// Forward-slash form of a path string so entries, exclusions and CI
/// artifacts compare the same on every platform.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Project-relative entry from a config file or CI artifact: forward slashes,
/// no `./` prefix, no trailing slash. Blank entries yield `None`, since an
/// empty directory prefix would match everything.
pub fn normalize_entry(raw: &str) -> Option<PathBuf> {
    let normalized = normalize_path(raw.trim());
    let mut entry = normalized.as_str();
    while let Some(rest) = entry.strip_prefix("./") {
        entry = rest;
    }
    let entry = entry.trim_end_matches('/');
    (!entry.is_empty()).then(|| PathBuf::from(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_backslashes() {
        assert_eq!(normalize_path(r"test\L1\Foo.t.sol"), "test/L1/Foo.t.sol");
        assert_eq!(normalize_path("test/L1/Foo.t.sol"), "test/L1/Foo.t.sol");
    }

    #[test]
    fn entries_drop_dot_prefix_and_trailing_slash() {
        assert_eq!(normalize_entry("./test/legacy/"), Some(PathBuf::from("test/legacy")));
        assert_eq!(normalize_entry(r".\test\Foo.t.sol"), Some(PathBuf::from("test/Foo.t.sol")));
        assert_eq!(normalize_entry("  "), None);
        assert_eq!(normalize_entry("./"), None);
    }
}
