//! Folder creation.

use std::fs;

use super::{ActionContext, ActionError, ActionHandler, PolicyViolation, Report, ValidatedRequest};
use crate::file::{quota, validate_dir_name, ValidationError};

/// Creates `name` inside the target directory.
pub(crate) struct CreateFolder;

impl ActionHandler for CreateFolder {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        Report::from_result(create(ctx, &request))
    }
}

fn create(ctx: &ActionContext<'_>, request: &ValidatedRequest) -> Result<String, ActionError> {
    let name = request.name.as_deref().ok_or(ValidationError::MissingName)?;
    // the target may have been flagged as a file; the new entry is always a folder
    validate_dir_name(name)?;

    let limit = ctx.policy.max_folders;
    if quota::folder_count(ctx.root.base_path()) + 1 > limit {
        return Err(PolicyViolation::FolderLimit { limit }.into());
    }

    let path = ctx.root.resolve(&request.target.join(name));
    fs::create_dir(&path).map_err(|e| {
        ActionError::filesystem(format!("Folder couldn't be created : {name}"), e)
    })?;

    tracing::info!(path = %path.display(), "Folder created");
    Ok(format!("Folder created successfully : {name}"))
}
