//! Collision-free naming inside a directory.

use std::path::Path;

use super::path::split_extension;

/// Number of numbered variants tried before giving up.
pub const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Pick a name for `filename` that does not yet exist in `directory`.
///
/// An unused name is returned unchanged. Otherwise a counter is inserted
/// before the extension (`a.txt` becomes `a.0.txt`, `a.1.txt`, ...) or
/// appended to extensionless names (`a` becomes `a.0`). When every variant up
/// to `999` is taken, the `999` variant is returned anyway.
pub fn resolve(directory: &Path, filename: &str) -> String {
    if !directory.join(filename).exists() {
        return filename.to_string();
    }

    let (stem, ext) = split_extension(filename);
    let variant = |i: u32| match ext {
        Some(ext) => format!("{stem}.{i}.{ext}"),
        None => format!("{filename}.{i}"),
    };

    (0..MAX_COLLISION_ATTEMPTS)
        .map(variant)
        .find(|candidate| !directory.join(candidate).exists())
        .unwrap_or_else(|| variant(MAX_COLLISION_ATTEMPTS - 1))
}
