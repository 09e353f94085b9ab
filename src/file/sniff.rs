//! Content-type verification of stored files.
//!
//! A client chooses the extension of an upload, but not the bytes the server
//! ends up holding. After a file has been written, a sniffer inspects its
//! leading bytes and the file is kept only if one of the extensions matching
//! the detected type is on the allow-list.

use std::io;
use std::path::Path;

use super::policy::Policy;

/// A content type detected from file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    /// Detected MIME type.
    pub mime: String,
    /// Extensions (without dot) associated with that type.
    pub extensions: Vec<String>,
}

/// Detects the type of a file from its content.
pub trait ContentSniffer: Send + Sync {
    /// Inspect the file at `path`.
    ///
    /// Returns `Ok(None)` when the content has no recognizable signature
    /// (plain text, for example).
    fn sniff(&self, path: &Path) -> io::Result<Option<Sniffed>>;
}

/// Magic-number sniffer backed by the `infer` crate, with extensions
/// completed from the `mime_guess` tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferSniffer;

impl ContentSniffer for InferSniffer {
    fn sniff(&self, path: &Path) -> io::Result<Option<Sniffed>> {
        let Some(kind) = infer::get_from_path(path)? else {
            return Ok(None);
        };

        let mut extensions = vec![kind.extension().to_string()];
        if let Some(known) = mime_guess::get_mime_extensions_str(kind.mime_type()) {
            for ext in known {
                if !extensions.iter().any(|e| e == ext) {
                    extensions.push((*ext).to_string());
                }
            }
        }

        Ok(Some(Sniffed {
            mime: kind.mime_type().to_string(),
            extensions,
        }))
    }
}

/// Whether the stored file at `path` may stay under `policy`.
///
/// Unrecognized content is accepted: the extension check already ran before
/// the bytes were written. Read errors count as a mismatch.
pub fn content_allowed(sniffer: &dyn ContentSniffer, policy: &Policy, path: &Path) -> bool {
    if !policy.sniffs_content() {
        return true;
    }
    match sniffer.sniff(path) {
        Ok(None) => true,
        Ok(Some(sniffed)) => {
            let allowed = policy
                .extensions
                .allows_any(sniffed.extensions.iter().map(String::as_str));
            if !allowed {
                tracing::debug!(mime = %sniffed.mime, path = %path.display(), "Content type not allowed");
            }
            allowed
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to sniff content type");
            false
        }
    }
}
