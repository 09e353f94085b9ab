//! The root directory all file operations are confined to.
//!
//! Read-only access for the hosting layer goes through here:
//! - Resolving validated relative paths onto the root
//! - Opening files and directory tarballs for download
//! - Loading raw bytes and a guessed MIME type for thumbnails
//! - Tree snapshots and disk usage

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::archive::write_tar_gz;
use super::path::{EntryKind, RelativePath};
use super::quota;
use super::tree::{self, Snapshot};
use crate::{FilemanError, Result};

/// Archive name used when the whole root is downloaded.
const ROOT_ARCHIVE_NAME: &str = "root";

/// The confined base directory.
#[derive(Debug, Clone)]
pub struct Root {
    /// Canonical absolute path of the root.
    base_path: PathBuf,
}

impl Root {
    /// Open the root at `base_path`.
    ///
    /// The directory is created if it doesn't exist. Anything that prevents
    /// using it as a directory is a configuration error.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            FilemanError::Config(format!("cannot create root {}: {e}", base_path.display()))
        })?;

        let base_path = base_path.canonicalize()?;
        if !base_path.is_dir() {
            return Err(FilemanError::Config(format!(
                "root {} is not a directory",
                base_path.display()
            )));
        }

        Ok(Self { base_path })
    }

    /// Get the base path of the root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the filesystem path for a validated relative path.
    pub fn resolve(&self, path: &RelativePath) -> PathBuf {
        path.to_fs_path(&self.base_path)
    }

    /// Total size of all files under the root.
    pub fn usage(&self) -> u64 {
        quota::subtree_size(&self.base_path)
    }

    /// Walk the root and build a tree snapshot focused on `current`.
    pub fn snapshot(&self, current: &RelativePath) -> Snapshot {
        tree::snapshot(&self.base_path, current)
    }

    /// Open a file or directory for download.
    pub fn open_download(&self, raw_path: &str, kind: EntryKind) -> Result<Download> {
        let path = RelativePath::parse(raw_path)?;
        let full_path = self.resolve(&path);

        match kind {
            EntryKind::File => {
                let name = path
                    .name()
                    .ok_or_else(|| FilemanError::Validation("root is not a file".to_string()))?
                    .to_string();
                let file = open_existing(&full_path, &path)?;
                let metadata = file.metadata()?;
                if !metadata.is_file() {
                    return Err(FilemanError::NotFound(format!("File: {path}")));
                }

                Ok(Download::File(FileDownload {
                    mime: guess_mime(&name),
                    len: metadata.len(),
                    name,
                    file,
                }))
            }
            EntryKind::Directory => {
                if !full_path.is_dir() {
                    return Err(FilemanError::NotFound(format!("Folder: {path}")));
                }
                let name = path.name().unwrap_or(ROOT_ARCHIVE_NAME).to_string();

                Ok(Download::Directory(DirArchive {
                    source: full_path,
                    name,
                }))
            }
        }
    }

    /// Load the raw bytes of a file along with its guessed MIME type.
    ///
    /// Scaling and caching are left to the caller.
    pub fn open_media(&self, raw_path: &str) -> Result<Media> {
        let path = RelativePath::parse(raw_path)?;
        let name = path
            .name()
            .ok_or_else(|| FilemanError::Validation("root is not a file".to_string()))?;
        let full_path = self.resolve(&path);

        if !full_path.is_file() {
            return Err(FilemanError::NotFound(format!("File: {path}")));
        }

        Ok(Media {
            mime: guess_mime(name),
            bytes: fs::read(&full_path)?,
        })
    }
}

fn open_existing(full_path: &Path, path: &RelativePath) -> Result<File> {
    match File::open(full_path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(FilemanError::NotFound(format!("File: {path}")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Guess a MIME type from a file name.
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}

/// Something that can be downloaded.
#[derive(Debug)]
pub enum Download {
    File(FileDownload),
    Directory(DirArchive),
}

/// An open file ready to be streamed.
#[derive(Debug)]
pub struct FileDownload {
    /// Open handle positioned at the start.
    pub file: File,
    /// Size in bytes.
    pub len: u64,
    /// Base name of the file.
    pub name: String,
    /// Guessed MIME type.
    pub mime: String,
}

/// A directory to be streamed as a gzip'd tarball.
#[derive(Debug, Clone)]
pub struct DirArchive {
    source: PathBuf,
    name: String,
}

impl DirArchive {
    /// MIME type of the produced stream.
    pub const MIME: &'static str = "application/x-gzip";

    /// Name offered to the client, e.g. `photos.tar.gz`.
    pub fn file_name(&self) -> String {
        format!("{}.tar.gz", self.name)
    }

    /// Write the tarball into `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> io::Result<W> {
        write_tar_gz(&self.source, &self.name, writer)
    }
}

/// Raw file content for the thumbnail renderer.
#[derive(Debug, Clone)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub mime: String,
}
