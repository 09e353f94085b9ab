//! Name and path validation.
//!
//! Every name and path that arrives from a client is checked here on the raw
//! string, before it is ever joined onto the root directory. The grammars are
//! allow-lists anchored at both ends, and `..` is rejected outright, so a
//! validated [`RelativePath`] can only address entries below the root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Maximum length of a new file or folder name (in characters).
pub const MAX_NAME_LENGTH: usize = 32;

/// Name prefix of files still being written. Such entries are not part of
/// the tree: clients can neither see nor address them.
pub const STAGING_PREFIX: &str = ".fileman-staging-";

/// Whether `name` is an in-flight staging file.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX)
}

static DIR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\d_ \-]+$").expect("directory name pattern"));

static FILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\d_ \-.]+$").expect("file name pattern"));

static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\d_ \-/.]*$").expect("path pattern"));

/// Validation errors for names and paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Folder name does not match the directory grammar.
    #[error("Invalid folder name : {0}")]
    InvalidFolderName(String),

    /// File name does not match the file grammar or contains `..`.
    #[error("Invalid file name : {0}")]
    InvalidFileName(String),

    /// Uploaded file's own name failed the file grammar.
    #[error("File name is not valid : {0}")]
    InvalidUploadName(String),

    /// Path does not match the path grammar, contains `..` or names a
    /// staging file.
    #[error("Invalid path : {0}")]
    InvalidPath(String),

    /// New name exceeds [`MAX_NAME_LENGTH`].
    #[error("Name is too long (max {MAX_NAME_LENGTH} characters) : {0}")]
    NameTooLong(String),

    /// The action needs a name and none was given.
    #[error("A name is required for this action")]
    MissingName,

    /// Rename would change a file's extension.
    #[error("File extension should be same : .{0}")]
    ExtensionChanged(String),

    /// Rename would add an extension to a file that had none.
    #[error("New file extension didn't match with old file extension")]
    ExtensionAdded,

    /// Unzip was requested on a directory.
    #[error("Cannot unzip a directory")]
    UnzipDirectory,
}

/// Whether an action addresses a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Build from the `is_directory` flag of a request.
    pub fn from_is_directory(is_directory: bool) -> Self {
        if is_directory {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Capitalized label used as a message prefix.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "File",
            EntryKind::Directory => "Folder",
        }
    }
}

/// Validate a directory name.
///
/// Directory names never carry an extension, so dots are not part of the
/// grammar at all.
///
/// # Examples
///
/// ```
/// use fileman::file::validate_dir_name;
///
/// assert!(validate_dir_name("photos 2024").is_ok());
/// assert!(validate_dir_name("a/b").is_err());
/// ```
pub fn validate_dir_name(name: &str) -> Result<(), ValidationError> {
    if DIR_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFolderName(name.to_string()))
    }
}

/// Validate a file name.
///
/// # Examples
///
/// ```
/// use fileman::file::validate_file_name;
///
/// assert!(validate_file_name("report.v2.pdf").is_ok());
/// assert!(validate_file_name("..hidden").is_err());
/// ```
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    if name.contains("..") || is_staging_name(name) || !FILE_NAME_RE.is_match(name) {
        Err(ValidationError::InvalidFileName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Validate a name according to the kind of entry it will name.
pub fn validate_name(name: &str, kind: EntryKind) -> Result<(), ValidationError> {
    match kind {
        EntryKind::File => validate_file_name(name),
        EntryKind::Directory => validate_dir_name(name),
    }
}

/// Validate a name supplied for a new or renamed entry.
pub fn validate_new_name(name: &str, kind: EntryKind) -> Result<(), ValidationError> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong(name.to_string()));
    }
    validate_name(name, kind)
}

/// Split a file name at its last dot.
///
/// Returns `(stem, Some(extension))`, or `(name, None)` when there is no dot.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
        None => (name, None),
    }
}

/// A validated, normalized path relative to the root directory.
///
/// The empty segment list is the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Validate and normalize a raw client path.
    ///
    /// Leading, trailing and repeated slashes are accepted and dropped.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.contains("..") || !PATH_RE.is_match(raw) {
            return Err(ValidationError::InvalidPath(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || is_staging_name(segment) {
                return Err(ValidationError::InvalidPath(raw.to_string()));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory. The parent of the root is the root.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Append one already validated name.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Append every segment of `other`.
    pub fn concat(&self, other: &RelativePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `self` equals `ancestor` or lies somewhere below it.
    ///
    /// The comparison is per segment, so `/foobar` is not inside `/foo`.
    pub fn starts_with(&self, ancestor: &RelativePath) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments.iter().zip(&ancestor.segments).all(|(a, b)| a == b)
    }

    /// Resolve onto a root directory.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}
