//! Failure taxonomy for actions.
//!
//! Every failure an action can hit falls into one of four kinds. The
//! `Display` text of each is the message shown to the operator; OS error
//! details stay in the `source` chain and only reach the logs.

use std::io;

use thiserror::Error;

use crate::file::ValidationError;

/// A quota, size, extension or folder-count limit was hit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("File size exceeded {limit_kb} KB : {name}")]
    FileTooLarge { limit_kb: u64, name: String },

    #[error("Total Space size exceeded {limit_kb} KB : {name}")]
    SpaceExceeded { limit_kb: u64, name: String },

    #[error("File extension not allowed (.{ext}) : {name}")]
    ExtensionNotAllowed { ext: String, name: String },

    #[error("No file extension in uploaded file : {name}")]
    MissingExtension { name: String },

    #[error("File type not allowed : {name}")]
    ContentTypeMismatch { name: String },

    #[error("Folder couldn't be created because maximum number of folders exceeded : {limit}")]
    FolderLimit { limit: usize },

    #[error("File in the zip is not allowed : {name}")]
    ArchiveEntryNotAllowed { name: String },
}

/// The request conflicts with the shape of the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("root folder can't be deleted")]
    RootDeletion,

    #[error("root folder can't be renamed")]
    RootRename,

    #[error("Cannot move/copy to a child folder")]
    IntoOwnChild,

    #[error("ERROR: A file/folder with this name already exists in the destination folder.")]
    DestinationExists,
}

/// Why a single sub-operation of an action failed.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Malformed name or path, rejected before touching the filesystem.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A configured limit was exceeded.
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// The operation contradicts the tree (root, own child, collision).
    #[error(transparent)]
    Conflict(#[from] Conflict),

    /// Any other OS-level failure.
    #[error("{message}")]
    Filesystem {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    /// Build a filesystem error with a stable operator-facing message.
    pub fn filesystem(message: impl Into<String>, source: io::Error) -> Self {
        ActionError::Filesystem {
            message: message.into(),
            source,
        }
    }

    /// Short name of the error kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Validation(_) => "validation",
            ActionError::Policy(_) => "policy",
            ActionError::Conflict(_) => "conflict",
            ActionError::Filesystem { .. } => "filesystem",
        }
    }
}
