//! Lookup of extracted files inside a working directory

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every file under `dir` (recursively) whose name satisfies `matches`,
/// sorted by path so repeated runs see the same order.
pub fn find_files(dir: &Path, matches: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().map(&matches).unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

/// First file under `dir` whose name ends with `suffix`
pub fn find_first(dir: &Path, suffix: &str) -> Option<PathBuf> {
    find_files(dir, |name| name.ends_with(suffix)).into_iter().next()
}
