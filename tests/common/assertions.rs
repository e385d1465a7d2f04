//! Assertions on the output directory

use std::path::{Path, PathBuf};

/// Files in `dir`, sorted by name
pub fn output_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}

/// Assert that `dir` holds exactly `expected` files
pub fn assert_file_count(dir: &Path, expected: usize) {
    let files = output_files(dir);
    assert_eq!(
        files.len(),
        expected,
        "expected {expected} output files, found {files:?}"
    );
}

/// File name component of a path
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
