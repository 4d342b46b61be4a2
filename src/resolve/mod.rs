//! Test-to-contract resolution by naming and directory convention

use crate::domain::ProjectLayout;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Map a test file to the source artifact it presumably exercises.
///
/// `test/L1/Foo.t.sol` resolves to `src/L1/Foo.sol` when that file exists,
/// otherwise to the first `Foo.sol` found anywhere under the source root.
/// Several `Foo.sol` files in different directories are not disambiguated:
/// each directory's own files are checked before its subdirectories, both in
/// name order.
pub fn resolve(test_file: &Path, layout: &ProjectLayout) -> Option<PathBuf> {
    let name = entity_name(test_file, &layout.test_suffix)?;
    let source_name = format!("{name}{}", layout.source_extension);

    if let Some(subdir) =
        test_file.strip_prefix(&layout.test_root).ok().and_then(|rel| rel.parent())
    {
        let mirrored = layout.source_root.join(subdir).join(&source_name);
        if mirrored.is_file() {
            return Some(mirrored);
        }
    }

    let found = find_by_name(&layout.source_root, &source_name);
    if found.is_none() {
        tracing::debug!("No source artifact for {}", test_file.display());
    }
    found
}

/// File name with the test suffix stripped, e.g. `Foo.t.sol` -> `Foo`.
fn entity_name<'a>(test_file: &'a Path, test_suffix: &str) -> Option<&'a str> {
    let file_name = test_file.file_name()?.to_str()?;
    let name = file_name.strip_suffix(test_suffix)?;
    (!name.is_empty()).then_some(name)
}

fn find_by_name(root: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| entry.file_name().to_str() == Some(file_name))
        .map(|entry| entry.into_path())
}
