//! Deleting files and folders.

use std::fs;

use super::{labeled, ActionContext, ActionError, ActionHandler, Conflict, Report, ValidatedRequest};
use crate::file::EntryKind;

/// Removes a file, or a folder with everything below it.
pub(crate) struct Delete;

impl ActionHandler for Delete {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        Report::from_result(delete(ctx, &request))
    }
}

fn delete(ctx: &ActionContext<'_>, request: &ValidatedRequest) -> Result<String, ActionError> {
    let name = request.target.name().ok_or(Conflict::RootDeletion)?;
    let path = ctx.root.resolve(&request.target);

    let result = match request.entry {
        EntryKind::Directory => fs::remove_dir_all(&path),
        EntryKind::File => fs::remove_file(&path),
    };
    result.map_err(|e| {
        ActionError::filesystem(labeled(request.entry, format!("couldn't be deleted : {name}")), e)
    })?;

    tracing::info!(path = %path.display(), "Entry deleted");
    Ok(labeled(request.entry, format!("deleted successfully : {name}")))
}
