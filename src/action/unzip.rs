//! Zip extraction into the focused directory.

use std::fs;
use std::io;

use super::store::store;
use super::{ActionContext, ActionError, ActionHandler, PolicyViolation, Report, ValidatedRequest};
use crate::file::archive::{entry_path, open_zip};
use crate::file::{quota, EntryKind, ExtensionCheck, RelativePath, ValidationError};

const UNZIP_FAILED: &str = "ERROR : Could not unzip the file.";
const UNZIP_SUCCESS: &str = "Extraction completed successfully.";

/// Extracts the zip at `target_path` into `current_path`.
///
/// Entries are processed one at a time. Entries with a bad path or a
/// disallowed extension or content are skipped with a message; an unreadable
/// archive stops the extraction. Extracted files never replace existing ones,
/// and the folders an archive brings along count against the folder limit.
pub(crate) struct Unzip;

impl ActionHandler for Unzip {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        if request.entry == EntryKind::Directory {
            return Report::failure(ValidationError::UnzipDirectory.into());
        }

        let mut report = Report::default();
        if let Err(err) = extract(ctx, &request, &mut report) {
            report.push_error(err);
        }
        if report.is_empty() {
            report.push_success(UNZIP_SUCCESS);
        }
        report
    }
}

fn failed(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> ActionError {
    ActionError::filesystem(UNZIP_FAILED, io::Error::other(source))
}

/// Extract every entry. Per-entry rejections go into `report`; the returned
/// error aborts the remaining entries.
fn extract(
    ctx: &ActionContext<'_>,
    request: &ValidatedRequest,
    report: &mut Report,
) -> Result<(), ActionError> {
    let archive_path = ctx.root.resolve(&request.target);
    let mut archive = open_zip(&archive_path).map_err(failed)?;
    let policy = ctx.policy;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(failed)?;
        let name = entry.name().to_string();

        let Some(relative) = entry_path(&name) else {
            report.push_error(PolicyViolation::ArchiveEntryNotAllowed { name }.into());
            continue;
        };
        let destination = request.current.concat(&relative);

        if entry.is_dir() {
            match create_dirs(ctx, &destination) {
                Ok(()) => {}
                Err(err @ ActionError::Filesystem { .. }) => return Err(err),
                Err(err) => report.push_error(err),
            }
            continue;
        }

        let Some(filename) = destination.name().map(str::to_string) else {
            continue;
        };
        if policy.check_extension(&filename) != ExtensionCheck::Allowed {
            report.push_error(PolicyViolation::ArchiveEntryNotAllowed { name }.into());
            continue;
        }
        if let Err(err) = check_declared_size(ctx, entry.size(), &name) {
            report.push_error(err);
            continue;
        }

        let parent = destination.parent();
        match create_dirs(ctx, &parent) {
            Ok(()) => {}
            Err(err @ ActionError::Filesystem { .. }) => return Err(err),
            Err(err) => {
                report.push_error(err);
                continue;
            }
        }
        let dir = ctx.root.resolve(&parent);

        match store(ctx, &dir, &filename, &mut entry, &name) {
            Ok(path) => tracing::debug!(path = %path.display(), "Entry extracted"),
            Err(ActionError::Policy(PolicyViolation::ContentTypeMismatch { name })) => {
                report.push_error(PolicyViolation::ArchiveEntryNotAllowed { name }.into());
            }
            Err(ActionError::Filesystem { source, .. }) => return Err(failed(source)),
            Err(err) => report.push_error(err),
        }
    }

    tracing::info!(
        archive = %archive_path.display(),
        into = %request.current,
        entries = archive.len(),
        "Archive extracted"
    );
    Ok(())
}

/// Create `path` and any missing parents, within the folder limit.
fn create_dirs(ctx: &ActionContext<'_>, path: &RelativePath) -> Result<(), ActionError> {
    let mut missing = 0;
    let mut ancestor = path.clone();
    while !ancestor.is_root() && !ctx.root.resolve(&ancestor).exists() {
        missing += 1;
        ancestor = ancestor.parent();
    }
    if missing == 0 {
        return Ok(());
    }

    let limit = ctx.policy.max_folders;
    if quota::folder_count(ctx.root.base_path()) + missing > limit {
        return Err(PolicyViolation::FolderLimit { limit }.into());
    }
    fs::create_dir_all(ctx.root.resolve(path)).map_err(failed)
}

/// Size and space limits against the size recorded in the archive.
fn check_declared_size(ctx: &ActionContext<'_>, size: u64, name: &str) -> Result<(), ActionError> {
    let policy = ctx.policy;
    if size > policy.max_file_size_bytes {
        return Err(PolicyViolation::FileTooLarge {
            limit_kb: policy.max_file_size_kb(),
            name: name.to_string(),
        }
        .into());
    }
    if policy.check_space
        && quota::subtree_size(ctx.root.base_path()).saturating_add(size) > policy.max_space_bytes
    {
        return Err(PolicyViolation::SpaceExceeded {
            limit_kb: policy.max_space_kb(),
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}
