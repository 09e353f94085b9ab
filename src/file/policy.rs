//! Upload and folder policy.

use std::collections::BTreeSet;

use super::path::split_extension;

/// Which file extensions may be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionPolicy {
    /// Every file is accepted, with or without an extension.
    Any,
    /// Only these extensions (without the leading dot) are accepted.
    Only(BTreeSet<String>),
}

impl ExtensionPolicy {
    /// Build an allow-list from extension strings. A leading dot is ignored.
    pub fn only<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ExtensionPolicy::Only(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
        )
    }

    /// Whether `ext` is allowed. Matching is case-sensitive.
    pub fn allows(&self, ext: &str) -> bool {
        match self {
            ExtensionPolicy::Any => true,
            ExtensionPolicy::Only(set) => set.contains(ext),
        }
    }

    /// Whether at least one of `candidates` is allowed.
    pub fn allows_any<'a>(&self, mut candidates: impl Iterator<Item = &'a str>) -> bool {
        match self {
            ExtensionPolicy::Any => true,
            ExtensionPolicy::Only(set) => candidates.any(|ext| set.contains(ext)),
        }
    }
}

/// Verdict of the extension check on a single file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionCheck {
    Allowed,
    /// The name has no extension and the policy is an allow-list.
    Missing,
    /// The extension is not on the allow-list.
    Rejected(String),
}

/// Limits applied to mutating actions.
///
/// Built once at startup and shared read-only by every action.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Maximum number of directories in the tree, root included.
    pub max_folders: usize,
    /// Maximum total size of all files in bytes.
    pub max_space_bytes: u64,
    /// Maximum size of one file in bytes.
    pub max_file_size_bytes: u64,
    /// Allowed extensions.
    pub extensions: ExtensionPolicy,
    /// Whether the total space limit is enforced.
    pub check_space: bool,
    /// Whether stored files are re-checked by content.
    pub verify_content_type: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_folders: 50,
            max_space_bytes: 5 * 1024 * 1024,
            max_file_size_bytes: 1024 * 1024,
            extensions: ExtensionPolicy::Any,
            check_space: true,
            verify_content_type: true,
        }
    }
}

impl Policy {
    /// Check the extension of a file name (text after the last dot).
    pub fn check_extension(&self, filename: &str) -> ExtensionCheck {
        if matches!(self.extensions, ExtensionPolicy::Any) {
            return ExtensionCheck::Allowed;
        }
        match split_extension(filename) {
            (_, None) => ExtensionCheck::Missing,
            (_, Some(ext)) if self.extensions.allows(ext) => ExtensionCheck::Allowed,
            (_, Some(ext)) => ExtensionCheck::Rejected(ext.to_string()),
        }
    }

    /// Space limit in kilobytes, for messages.
    pub fn max_space_kb(&self) -> u64 {
        self.max_space_bytes / 1024
    }

    /// File size limit in kilobytes, for messages.
    pub fn max_file_size_kb(&self) -> u64 {
        self.max_file_size_bytes / 1024
    }

    /// Whether content sniffing applies at all.
    pub fn sniffs_content(&self) -> bool {
        self.verify_content_type && matches!(self.extensions, ExtensionPolicy::Only(_))
    }
}
