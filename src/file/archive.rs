//! Archive helpers: zip input for extraction, tar+gzip output for directory
//! downloads.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use zip::ZipArchive;

use super::path::RelativePath;
use crate::Result;

/// Open a zip archive for reading.
pub fn open_zip(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Map a zip entry name onto a relative path.
///
/// Returns `None` for names outside the path grammar, names containing `..`
/// and names that normalize to nothing. Directory entries keep their path
/// without the trailing slash.
pub fn entry_path(entry_name: &str) -> Option<RelativePath> {
    RelativePath::parse(entry_name)
        .ok()
        .filter(|path| !path.is_root())
}

/// Write `source` as a gzip-compressed tarball into `writer`.
///
/// Entries are stored under `arcname`, so unpacking recreates a single
/// top-level directory (or file) of that name.
pub fn write_tar_gz<W: Write>(source: &Path, arcname: &str, writer: W) -> io::Result<W> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    if source.is_dir() {
        builder.append_dir_all(arcname, source)?;
    } else {
        builder.append_path_with_name(source, arcname)?;
    }

    builder.into_inner()?.finish()
}
