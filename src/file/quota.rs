//! Disk usage accounting for a subtree.
//!
//! Both functions walk the live filesystem on every call. Entries that vanish
//! or cannot be read while the walk is in progress are skipped, so the result
//! is a best-effort figure rather than an error.

use std::path::Path;

use walkdir::WalkDir;

/// Total size in bytes of all regular files below `path`.
pub fn subtree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Number of directories below `path`, counting `path` itself.
pub fn folder_count(path: &Path) -> usize {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .count()
}
