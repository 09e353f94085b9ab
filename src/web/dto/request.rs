//! Request DTOs for the web API.
//!
//! The action form itself is multipart and parsed field by field in the
//! action handler; only query strings are described here.

use serde::Deserialize;

use crate::file::EntryKind;

fn default_current_path() -> String {
    "/".to_string()
}

/// Query of `GET /api/tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeQuery {
    /// Path the tree is focused on.
    #[serde(default = "default_current_path")]
    pub current_path: String,
}

/// `file` or `dir`, as sent by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKindParam {
    #[default]
    File,
    Dir,
}

impl From<EntryKindParam> for EntryKind {
    fn from(param: EntryKindParam) -> Self {
        match param {
            EntryKindParam::File => EntryKind::File,
            EntryKindParam::Dir => EntryKind::Directory,
        }
    }
}

/// Query of `GET /api/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    /// Entry to download.
    pub path: String,
    /// Whether `path` is a file or a directory.
    #[serde(default)]
    pub kind: EntryKindParam,
}

/// Query of `GET /api/media`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaQuery {
    /// File to serve.
    pub path: String,
}
