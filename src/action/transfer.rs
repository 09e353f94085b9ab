//! Moving and copying entries into the focused directory.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::{labeled, ActionContext, ActionError, ActionHandler, Conflict, Report, ValidatedRequest};
use crate::file::EntryKind;

/// Move or copy `target_path` into `current_path`, keeping its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    Move,
    Copy,
}

impl Transfer {
    fn verb(&self) -> &'static str {
        match self {
            Transfer::Move => "moved",
            Transfer::Copy => "copied",
        }
    }
}

impl ActionHandler for Transfer {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        Report::from_result(transfer(*self, ctx, &request))
    }
}

fn transfer(
    mode: Transfer,
    ctx: &ActionContext<'_>,
    request: &ValidatedRequest,
) -> Result<String, ActionError> {
    // the root has no name and every destination lies inside it
    let name = match request.target.name() {
        Some(name) if !request.current.starts_with(&request.target) => name,
        _ => return Err(Conflict::IntoOwnChild.into()),
    };

    let source = ctx.root.resolve(&request.target);
    let destination = ctx.root.resolve(&request.current.join(name));
    if destination.symlink_metadata().is_ok() {
        return Err(Conflict::DestinationExists.into());
    }

    let result = match mode {
        Transfer::Move => move_entry(&source, &destination, request.entry),
        Transfer::Copy => copy_entry(&source, &destination, request.entry),
    };
    result.map_err(|e| ActionError::filesystem("File/folder couldn't be moved/copied.", e))?;

    tracing::info!(
        from = %source.display(),
        to = %destination.display(),
        "Entry {}",
        mode.verb()
    );
    Ok(labeled(
        request.entry,
        format!("{} successfully : {name}", mode.verb()),
    ))
}

/// Rename, falling back to copy and remove only when the destination is on
/// another filesystem.
fn move_entry(source: &Path, destination: &Path, entry: EntryKind) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(error = %e, "Rename crosses devices, copying instead");
            relocate(source, destination, entry, remove_entry)
        }
        result => result,
    }
}

/// Copy `source` to `destination`, then remove `source` with `remove`.
///
/// If the source cannot be removed and is still complete, the copy is taken
/// back out so the entry exists exactly once.
fn relocate(
    source: &Path,
    destination: &Path,
    entry: EntryKind,
    remove: impl FnOnce(&Path, EntryKind) -> io::Result<()>,
) -> io::Result<()> {
    copy_entry(source, destination, entry)?;

    let Err(e) = remove(source, entry) else {
        return Ok(());
    };
    if entry_count(source) == entry_count(destination) {
        if let Err(cleanup) = remove_entry(destination, entry) {
            tracing::warn!(error = %cleanup, path = %destination.display(), "Could not remove copy");
        }
    } else {
        tracing::warn!(
            path = %source.display(),
            "Source partially removed, keeping the copy"
        );
    }
    Err(e)
}

/// Copy a file or a directory tree. A failed copy leaves nothing behind.
fn copy_entry(source: &Path, destination: &Path, entry: EntryKind) -> io::Result<()> {
    let result = match entry {
        EntryKind::Directory => copy_tree(source, destination),
        EntryKind::File => fs::copy(source, destination).map(|_| ()),
    };
    if result.is_err() && destination.symlink_metadata().is_ok() {
        if let Err(cleanup) = remove_entry(destination, entry) {
            tracing::warn!(error = %cleanup, path = %destination.display(), "Could not remove partial copy");
        }
    }
    result
}

fn remove_entry(path: &Path, entry: EntryKind) -> io::Result<()> {
    match entry {
        EntryKind::Directory => fs::remove_dir_all(path),
        EntryKind::File => fs::remove_file(path),
    }
}

/// Number of entries a copy of `path` carries, itself included.
fn entry_count(path: &Path) -> usize {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_symlink())
        .count()
}

/// Recursively copy a directory. Symbolic links are skipped.
fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", source.display()),
        ));
    }

    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = destination.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
