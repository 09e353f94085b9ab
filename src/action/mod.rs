//! Action engine.
//!
//! An action is one mutating request from the file manager UI: upload, create
//! folder, rename, delete, move, copy or unzip. The engine validates the raw
//! request, picks a handler from a static table keyed by action kind and entry
//! kind, and runs it. Every outcome, good or bad, comes back as an ordered
//! list of messages; nothing escapes as an error or a panic.

mod delete;
mod error;
mod folder;
mod rename;
mod store;
mod transfer;
mod unzip;
mod upload;

use std::fmt;
use std::io::{Cursor, Read};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Serialize, Serializer};

use crate::file::{
    validate_new_name, ContentSniffer, EntryKind, InferSniffer, Policy, RelativePath, Root,
    Snapshot,
};

pub use error::{ActionError, Conflict, PolicyViolation};

/// The kinds of action the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Upload,
    Add,
    Rename,
    Delete,
    Move,
    Copy,
    Unzip,
}

impl ActionKind {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Upload => "upload",
            ActionKind::Add => "add",
            ActionKind::Rename => "rename",
            ActionKind::Delete => "delete",
            ActionKind::Move => "move",
            ActionKind::Copy => "copy",
            ActionKind::Unzip => "unzip",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionKind {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(ActionKind::Upload),
            "add" => Ok(ActionKind::Add),
            "rename" => Ok(ActionKind::Rename),
            "delete" => Ok(ActionKind::Delete),
            "move" => Ok(ActionKind::Move),
            "copy" => Ok(ActionKind::Copy),
            "unzip" => Ok(ActionKind::Unzip),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// One uploaded file: a declared name and size plus a byte stream that is
/// read exactly once.
pub struct UploadedFile {
    /// Client-supplied file name.
    pub name: String,
    /// Client-declared size in bytes.
    pub declared_size: u64,
    /// Content.
    pub reader: Box<dyn Read + Send>,
}

impl UploadedFile {
    /// Create an upload from any reader.
    pub fn new(name: impl Into<String>, declared_size: u64, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            declared_size,
            reader: Box::new(reader),
        }
    }

    /// Create an upload from in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self::new(name, size, Cursor::new(content))
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

/// A raw, unvalidated action request as parsed by the web layer.
#[derive(Debug)]
pub struct ActionRequest {
    /// What to do.
    pub kind: ActionKind,
    /// The entry acted on (or the target directory for upload/add).
    pub target_path: String,
    /// New name for add/rename.
    pub name: Option<String>,
    /// Whether `target_path` addresses a directory.
    pub is_directory: bool,
    /// Where the UI is focused; the destination of move/copy/unzip.
    pub current_path: String,
    /// Uploaded files in request order.
    pub files: Vec<UploadedFile>,
}

impl ActionRequest {
    /// Create a new request for a file entry focused on the root.
    pub fn new(kind: ActionKind, target_path: impl Into<String>) -> Self {
        Self {
            kind,
            target_path: target_path.into(),
            name: None,
            is_directory: false,
            current_path: "/".to_string(),
            files: Vec::new(),
        }
    }

    /// Set the new name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the target as a directory.
    pub fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }

    /// Set the focused path.
    pub fn with_current_path(mut self, current_path: impl Into<String>) -> Self {
        self.current_path = current_path.into();
        self
    }

    /// Add an uploaded file.
    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }
}

/// A request whose name and paths passed validation.
#[derive(Debug)]
pub(crate) struct ValidatedRequest {
    pub entry: EntryKind,
    pub target: RelativePath,
    pub current: RelativePath,
    pub name: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl ValidatedRequest {
    fn from_raw(request: ActionRequest) -> Result<Self, ActionError> {
        let entry = EntryKind::from_is_directory(request.is_directory);
        let name = request.name.filter(|n| !n.is_empty());

        if let Some(ref name) = name {
            validate_new_name(name, entry)?;
        }
        let target = RelativePath::parse(&request.target_path)?;
        let current = RelativePath::parse(&request.current_path)?;

        Ok(Self {
            entry,
            target,
            current,
            name,
            files: request.files,
        })
    }
}

/// One outcome line of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    success: bool,
}

impl Message {
    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this is a success line.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Ordered outcome messages of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    messages: Vec<Message>,
}

impl Report {
    /// A report with a single success line.
    pub fn success(text: impl Into<String>) -> Self {
        let mut report = Self::default();
        report.push_success(text);
        report
    }

    /// A report with a single failure.
    pub fn failure(err: ActionError) -> Self {
        let mut report = Self::default();
        report.push_error(err);
        report
    }

    /// Turn a single-step outcome into a report.
    pub fn from_result(result: Result<String, ActionError>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(err) => Self::failure(err),
        }
    }

    /// Append a success line.
    pub fn push_success(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            text: text.into(),
            success: true,
        });
    }

    /// Append a failure line. OS errors are logged with their cause.
    pub fn push_error(&mut self, err: ActionError) {
        match &err {
            ActionError::Filesystem { message, source } => {
                tracing::warn!(error = %source, "{}", message);
            }
            other => {
                tracing::debug!(kind = other.kind(), "{}", other);
            }
        }
        self.messages.push(Message {
            text: err.to_string(),
            success: false,
        });
    }

    /// Whether any success line was recorded.
    pub fn succeeded(&self) -> bool {
        self.messages.iter().any(Message::is_success)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// The messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The message texts in order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(Message::text).collect()
    }
}

/// Shared, read-only inputs every handler works with.
pub(crate) struct ActionContext<'a> {
    pub root: &'a Root,
    pub policy: &'a Policy,
    pub sniffer: &'a dyn ContentSniffer,
}

/// Implemented by every action.
pub(crate) trait ActionHandler: Sync {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report;
}

/// Static dispatch table over (action kind, entry kind).
fn handler_for(kind: ActionKind, entry: EntryKind) -> &'static dyn ActionHandler {
    match (kind, entry) {
        (ActionKind::Upload, _) => &upload::Upload,
        (ActionKind::Add, _) => &folder::CreateFolder,
        (ActionKind::Rename, EntryKind::File) => &rename::RenameFile,
        (ActionKind::Rename, EntryKind::Directory) => &rename::RenameFolder,
        (ActionKind::Delete, _) => &delete::Delete,
        (ActionKind::Move, _) => &transfer::Transfer::Move,
        (ActionKind::Copy, _) => &transfer::Transfer::Copy,
        (ActionKind::Unzip, _) => &unzip::Unzip,
    }
}

/// Runs actions against one root under one policy.
///
/// Mutating actions are serialized by a per-root lock, so collision
/// resolution and the write that follows it cannot interleave with another
/// action on the same engine. Snapshots and usage queries don't take the
/// lock.
pub struct ActionEngine {
    root: Root,
    policy: Policy,
    sniffer: Arc<dyn ContentSniffer>,
    write_lock: Mutex<()>,
}

impl ActionEngine {
    /// Create an engine with the default content sniffer.
    pub fn new(root: Root, policy: Policy) -> Self {
        Self {
            root,
            policy,
            sniffer: Arc::new(InferSniffer),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the content sniffer.
    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The policy in force.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Validate and run one action.
    pub fn execute(&self, request: ActionRequest) -> Report {
        let kind = request.kind;
        let span = tracing::info_span!(
            "action",
            kind = %kind,
            path = %request.target_path,
            current = %request.current_path
        );
        let _enter = span.enter();

        let request = match ValidatedRequest::from_raw(request) {
            Ok(request) => request,
            Err(err) => return Report::failure(err),
        };

        let handler = handler_for(kind, request.entry);
        let ctx = ActionContext {
            root: &self.root,
            policy: &self.policy,
            sniffer: self.sniffer.as_ref(),
        };

        let report = {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            handler.handle(&ctx, request)
        };

        tracing::info!(
            success = report.succeeded(),
            messages = report.len(),
            "Action finished"
        );
        report
    }

    /// Build a tree snapshot focused on a raw client path.
    ///
    /// An invalid path focuses the root.
    pub fn snapshot(&self, current_path: &str) -> Snapshot {
        let current = RelativePath::parse(current_path).unwrap_or_else(|e| {
            tracing::debug!("{}", e);
            RelativePath::root()
        });
        self.root.snapshot(&current)
    }

    /// Current disk usage of the root in bytes.
    pub fn usage(&self) -> u64 {
        self.root.usage()
    }
}

/// `"File"`/`"Folder"` prefixed message.
pub(crate) fn labeled(entry: EntryKind, text: impl fmt::Display) -> String {
    format!("{} {}", entry.label(), text)
}
