//! Streaming a byte source into the tree under a collision-free name.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, PersistError};

use super::{ActionContext, ActionError, PolicyViolation};
use crate::file::{collision, quota, sniff, STAGING_PREFIX};

/// How many times a lost race for a resolved name is retried.
const PUBLISH_ATTEMPTS: usize = 3;

/// Write `reader` into `dir` as `filename` (or a collision-free variant).
///
/// The bytes go to a temporary file inside `dir` first. At most
/// `max_file_size + 1` bytes are read, so a client that under-declares its
/// size is still caught. The space limit and the content type are checked
/// against what actually landed on disk, and only then is the file linked in
/// under its final name without replacing anything. `label` names the file
/// in messages.
pub(crate) fn store(
    ctx: &ActionContext<'_>,
    dir: &Path,
    filename: &str,
    reader: &mut dyn Read,
    label: &str,
) -> Result<PathBuf, ActionError> {
    let policy = ctx.policy;
    let fail = |e: io::Error| ActionError::filesystem(format!("File couldn't be saved : {label}"), e);

    let mut temp = Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)
        .map_err(fail)?;
    let limit = policy.max_file_size_bytes;
    let written = io::copy(&mut reader.take(limit.saturating_add(1)), temp.as_file_mut())
        .map_err(fail)?;

    if written > limit {
        return Err(PolicyViolation::FileTooLarge {
            limit_kb: policy.max_file_size_kb(),
            name: label.to_string(),
        }
        .into());
    }

    if policy.check_space && quota::subtree_size(ctx.root.base_path()) > policy.max_space_bytes {
        return Err(PolicyViolation::SpaceExceeded {
            limit_kb: policy.max_space_kb(),
            name: label.to_string(),
        }
        .into());
    }

    if !sniff::content_allowed(ctx.sniffer, policy, temp.path()) {
        return Err(PolicyViolation::ContentTypeMismatch {
            name: label.to_string(),
        }
        .into());
    }

    publish(temp, dir, filename).map_err(fail)
}

/// Link `temp` into `dir` under a name that does not exist yet.
fn publish(mut temp: NamedTempFile, dir: &Path, filename: &str) -> io::Result<PathBuf> {
    for _ in 0..PUBLISH_ATTEMPTS {
        let target = dir.join(collision::resolve(dir, filename));
        match temp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(PersistError { error, file }) if error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(target = %target.display(), "Name taken while publishing, retrying");
                temp = file;
            }
            Err(PersistError { error, .. }) => return Err(error),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {filename}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{ExtensionPolicy, InferSniffer, Policy, Root};
    use std::fs;
    use tempfile::TempDir;

    fn with_ctx<T>(policy: Policy, f: impl FnOnce(&ActionContext<'_>, &Path) -> T) -> T {
        let temp_dir = TempDir::new().unwrap();
        let root = Root::new(temp_dir.path()).unwrap();
        let ctx = ActionContext {
            root: &root,
            policy: &policy,
            sniffer: &InferSniffer,
        };
        f(&ctx, root.base_path())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_store_writes_and_resolves_collisions() {
        with_ctx(Policy::default(), |ctx, base| {
            let first = store(ctx, base, "a.txt", &mut &b"one"[..], "a.txt").unwrap();
            let second = store(ctx, base, "a.txt", &mut &b"two"[..], "a.txt").unwrap();

            assert_eq!(first, base.join("a.txt"));
            assert_eq!(second, base.join("a.0.txt"));
            assert_eq!(fs::read(&first).unwrap(), b"one");
            assert_eq!(fs::read(&second).unwrap(), b"two");
            assert_eq!(files_in(base), vec!["a.0.txt", "a.txt"]);
        });
    }

    #[test]
    fn test_store_caps_actual_size() {
        let policy = Policy {
            max_file_size_bytes: 4,
            ..Policy::default()
        };
        with_ctx(policy, |ctx, base| {
            let err = store(ctx, base, "big.bin", &mut &b"12345"[..], "big.bin").unwrap_err();

            assert!(matches!(
                err,
                ActionError::Policy(PolicyViolation::FileTooLarge { .. })
            ));
            assert!(files_in(base).is_empty());
        });
    }

    #[test]
    fn test_store_rechecks_space_after_write() {
        let policy = Policy {
            max_space_bytes: 4,
            ..Policy::default()
        };
        with_ctx(policy, |ctx, base| {
            let err = store(ctx, base, "a.bin", &mut &b"12345"[..], "a.bin").unwrap_err();

            assert!(matches!(
                err,
                ActionError::Policy(PolicyViolation::SpaceExceeded { .. })
            ));
            assert!(files_in(base).is_empty());
        });
    }

    #[test]
    fn test_store_rejects_disguised_content() {
        let policy = Policy {
            extensions: ExtensionPolicy::only(["txt"]),
            ..Policy::default()
        };
        with_ctx(policy, |ctx, base| {
            let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
            let err = store(ctx, base, "a.txt", &mut &png[..], "a.txt").unwrap_err();

            assert_eq!(err.to_string(), "File type not allowed : a.txt");
            assert!(files_in(base).is_empty());
        });
    }

    #[test]
    fn test_store_into_missing_dir_is_filesystem_error() {
        with_ctx(Policy::default(), |ctx, base| {
            let missing = base.join("nope");
            let err = store(ctx, &missing, "a.txt", &mut &b"x"[..], "a.txt").unwrap_err();

            assert_eq!(err.to_string(), "File couldn't be saved : a.txt");
        });
    }
}
