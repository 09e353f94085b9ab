//! Response DTOs for the web API.

use serde::Serialize;

use crate::action::Report;
use crate::file::{ExtensionPolicy, Policy, Snapshot, TreeNode};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Policy limits shown next to the tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Limits {
    pub max_folders: usize,
    pub max_file_size_kb: u64,
    pub max_space_kb: u64,
    /// Allowed extensions, or `null` when everything is allowed.
    pub extensions: Option<Vec<String>>,
}

impl From<&Policy> for Limits {
    fn from(policy: &Policy) -> Self {
        Self {
            max_folders: policy.max_folders,
            max_file_size_kb: policy.max_file_size_kb(),
            max_space_kb: policy.max_space_kb(),
            extensions: match &policy.extensions {
                ExtensionPolicy::Any => None,
                ExtensionPolicy::Only(set) => Some(set.iter().cloned().collect()),
            },
        }
    }
}

/// Tree, usage and limits.
#[derive(Debug, Serialize)]
pub struct TreeResponse {
    /// Nested directory structure.
    pub dir_structure: TreeNode,
    /// ID of the focused node.
    pub current_id: u64,
    /// Bytes used under the root; 0 when the space limit is not enforced.
    pub space_consumed: u64,
    /// Space limit in kilobytes.
    pub max_space: u64,
    /// Whether the UI shows usage.
    pub show_space: bool,
    pub limits: Limits,
}

impl TreeResponse {
    /// Assemble from a snapshot and the policy in force.
    pub fn new(snapshot: Snapshot, usage: Option<u64>, policy: &Policy, show_space: bool) -> Self {
        Self {
            dir_structure: snapshot.tree,
            current_id: snapshot.current_id,
            space_consumed: usage.unwrap_or(0),
            max_space: policy.max_space_kb(),
            show_space,
            limits: Limits::from(policy),
        }
    }
}

/// Outcome of `POST /api/action`.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Outcome messages in attempt order.
    pub messages: Report,
    /// Whether the action produced a success message.
    pub success: bool,
    #[serde(flatten)]
    pub tree: TreeResponse,
}

impl ActionResponse {
    pub fn new(report: Report, tree: TreeResponse) -> Self {
        Self {
            success: report.succeeded(),
            messages: report,
            tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::RelativePath;
    use tempfile::TempDir;

    #[test]
    fn test_limits_from_policy() {
        let policy = Policy {
            extensions: ExtensionPolicy::only(["txt", "pdf"]),
            ..Policy::default()
        };

        let limits = Limits::from(&policy);

        assert_eq!(limits.max_folders, 50);
        assert_eq!(limits.max_file_size_kb, 1024);
        assert_eq!(limits.max_space_kb, 5120);
        assert_eq!(
            limits.extensions,
            Some(vec!["pdf".to_string(), "txt".to_string()])
        );
        assert_eq!(Limits::from(&Policy::default()).extensions, None);
    }

    #[test]
    fn test_action_response_shape() {
        let dir = TempDir::new().unwrap();
        let snapshot = crate::file::snapshot(dir.path(), &RelativePath::root());
        let tree = TreeResponse::new(snapshot, Some(42), &Policy::default(), true);
        let response = ApiResponse::new(ActionResponse::new(Report::success("done"), tree));

        let value = serde_json::to_value(&response).unwrap();
        let data = &value["data"];

        assert_eq!(data["messages"], serde_json::json!(["done"]));
        assert_eq!(data["success"], true);
        assert_eq!(data["current_id"], 1);
        assert_eq!(data["space_consumed"], 42);
        assert_eq!(data["max_space"], 5120);
        assert_eq!(data["show_space"], true);
        assert_eq!(data["dir_structure"][""]["id"], 1);
        assert_eq!(data["limits"]["max_folders"], 50);
    }
}
