//! Directory tree snapshots.
//!
//! A snapshot is built fresh for every request by one walk of the root. Node
//! IDs come from a counter owned by that walk, so they are only meaningful
//! inside the snapshot that produced them.

use std::fs;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::path::{is_staging_name, RelativePath};

/// ID of the root node in every snapshot.
pub const ROOT_ID: u64 = 1;

/// Sequential ID source for a single snapshot.
#[derive(Debug)]
struct IdCounter(u64);

impl IdCounter {
    fn new() -> Self {
        Self(0)
    }

    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// A directory in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Snapshot-scoped ID.
    pub id: u64,
    /// Directory name (empty for the root).
    pub name: String,
    /// Whether the UI shows this node expanded.
    pub open: bool,
    /// Subdirectories in enumeration order.
    pub dirs: Vec<TreeNode>,
    /// File names in enumeration order.
    pub files: Vec<String>,
}

impl TreeNode {
    fn new(id: u64, name: String, open: bool) -> Self {
        Self {
            id,
            name,
            open,
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Find a direct subdirectory by name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.dirs.iter().find(|d| d.name == name)
    }

    /// Find the node at a relative path.
    pub fn find(&self, path: &RelativePath) -> Option<&TreeNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for dir in &self.dirs {
            dir.walk(visit);
        }
    }
}

/// Body of a node on the wire: `{"id", "open", "dirs", "files"}`.
struct NodeBody<'a>(&'a TreeNode);

/// Subdirectories on the wire: an object keyed by name, in tree order.
struct DirMap<'a>(&'a [TreeNode]);

impl Serialize for NodeBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("id", &self.0.id)?;
        map.serialize_entry("open", &self.0.open)?;
        map.serialize_entry("dirs", &DirMap(&self.0.dirs))?;
        map.serialize_entry("files", &self.0.files)?;
        map.end()
    }
}

impl Serialize for DirMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for dir in self.0 {
            map.serialize_entry(&dir.name, &NodeBody(dir))?;
        }
        map.end()
    }
}

impl Serialize for TreeNode {
    /// Serializes as `{"<name>": {...}}`; the root appears under `""`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DirMap(std::slice::from_ref(self)).serialize(serializer)
    }
}

/// Result of one tree walk.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// The root node.
    pub tree: TreeNode,
    /// ID of the node the client is focused on.
    pub current_id: u64,
}

/// Walk `root` and build a snapshot focused on `current`.
///
/// The root gets ID 1. Entering a directory hands out IDs to all of its
/// subdirectories before the walk descends into the first of them. A node is
/// open when it is the root or lies on the path to `current`. Entries that
/// vanish or cannot be read during the walk are skipped, and so are uploads
/// that are still being written.
pub fn snapshot(root: &Path, current: &RelativePath) -> Snapshot {
    let mut ids = IdCounter::new();
    let mut tree = TreeNode::new(ids.next(), String::new(), true);
    let mut location = Vec::new();

    fill(&mut tree, root, current, &mut location, &mut ids);

    let current_id = tree.find(current).map_or(ROOT_ID, |node| node.id);
    Snapshot { tree, current_id }
}

fn fill(
    node: &mut TreeNode,
    dir: &Path,
    current: &RelativePath,
    location: &mut Vec<String>,
    ids: &mut IdCounter,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, dir = %dir.display(), "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_dir() {
            location.push(name.clone());
            let open = on_current_path(location, current);
            location.pop();
            node.dirs.push(TreeNode::new(ids.next(), name, open));
        } else if !is_staging_name(&name) {
            node.files.push(name);
        }
    }

    for child in &mut node.dirs {
        location.push(child.name.clone());
        let child_dir = dir.join(&child.name);
        fill(child, &child_dir, current, location, ids);
        location.pop();
    }
}

fn on_current_path(location: &[String], current: &RelativePath) -> bool {
    let target = current.segments();
    location.len() <= target.len() && location.iter().zip(target).all(|(a, b)| a == b)
}
