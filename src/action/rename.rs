//! Renaming files and folders in place.

use std::fs;
use std::io;

use super::{labeled, ActionContext, ActionError, ActionHandler, Conflict, Report, ValidatedRequest};
use crate::file::{split_extension, EntryKind, ValidationError};

/// Renames a file. The extension must stay the same.
pub(crate) struct RenameFile;

/// Renames a folder.
pub(crate) struct RenameFolder;

impl ActionHandler for RenameFile {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        Report::from_result(rename(ctx, &request, EntryKind::File))
    }
}

impl ActionHandler for RenameFolder {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        Report::from_result(rename(ctx, &request, EntryKind::Directory))
    }
}

/// Compare the text after the last dot of both names.
fn check_same_extension(old: &str, new: &str) -> Result<(), ValidationError> {
    match (split_extension(old).1, split_extension(new).1) {
        (None, None) => Ok(()),
        (Some(a), Some(b)) if a == b => Ok(()),
        (Some(a), _) => Err(ValidationError::ExtensionChanged(a.to_string())),
        (None, Some(_)) => Err(ValidationError::ExtensionAdded),
    }
}

fn rename(
    ctx: &ActionContext<'_>,
    request: &ValidatedRequest,
    entry: EntryKind,
) -> Result<String, ActionError> {
    let new_name = request.name.as_deref().ok_or(ValidationError::MissingName)?;
    let old_name = request.target.name().ok_or(Conflict::RootRename)?;

    if entry == EntryKind::File {
        check_same_extension(old_name, new_name)?;
    }

    let from = ctx.root.resolve(&request.target);
    let to = ctx.root.resolve(&request.target.parent().join(new_name));
    let fail = |e: io::Error| {
        ActionError::filesystem(labeled(entry, format!("couldn't be renamed to {new_name}")), e)
    };

    // the client's file/folder flag picks the rules, so it must match the disk
    let metadata = from.symlink_metadata().map_err(fail)?;
    if metadata.is_dir() != (entry == EntryKind::Directory) {
        return Err(fail(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a {}", from.display(), entry.label().to_lowercase()),
        )));
    }

    // rename(2) silently replaces an existing file
    if to.symlink_metadata().is_ok() {
        return Err(fail(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists", to.display()),
        )));
    }
    fs::rename(&from, &to).map_err(fail)?;

    tracing::info!(from = %from.display(), to = %to.display(), "Entry renamed");
    Ok(labeled(
        entry,
        format!("renamed successfully from {old_name} to {new_name}"),
    ))
}
