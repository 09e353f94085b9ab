//! fileman - file manager backend
//!
//! Browse, upload and organize a directory tree confined to a single root,
//! under configurable quota and extension limits, over a small web API.

pub mod action;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use action::{
    ActionEngine, ActionError, ActionKind, ActionRequest, Conflict, Message, PolicyViolation,
    Report, UnknownAction, UploadedFile,
};
pub use config::Config;
pub use error::{FilemanError, Result};
pub use file::{
    EntryKind, ExtensionPolicy, Policy, RelativePath, Root, Snapshot, TreeNode, ValidationError,
};
pub use web::WebServer;
