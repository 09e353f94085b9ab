//! File tree primitives for fileman.
//!
//! This module provides the building blocks the action engine and the web
//! layer share:
//! - Name and path validation confined to a single root
//! - Collision-free naming and disk usage accounting
//! - Upload policy and content-type verification
//! - Tree snapshots, downloads and archive handling

pub mod archive;
pub mod collision;
pub mod path;
pub mod policy;
pub mod quota;
pub mod root;
pub mod sniff;
pub mod tree;

pub use path::{
    is_staging_name, split_extension, validate_dir_name, validate_file_name, validate_name,
    validate_new_name, EntryKind, RelativePath, ValidationError, MAX_NAME_LENGTH, STAGING_PREFIX,
};
pub use policy::{ExtensionCheck, ExtensionPolicy, Policy};
pub use root::{guess_mime, DirArchive, Download, FileDownload, Media, Root};
pub use sniff::{ContentSniffer, InferSniffer, Sniffed};
pub use tree::{snapshot, Snapshot, TreeNode, ROOT_ID};
