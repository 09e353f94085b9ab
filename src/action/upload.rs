//! Upload action.

use super::store::store;
use super::{ActionContext, ActionError, ActionHandler, PolicyViolation, Report, UploadedFile, ValidatedRequest};
use crate::file::{quota, validate_file_name, ExtensionCheck, RelativePath, ValidationError};

pub(crate) const UPLOAD_SUCCESS: &str = "All files uploaded successfully";

/// Stores every uploaded file into the target directory.
///
/// Files are handled independently and in request order: a rejected file
/// adds one message and does not stop the others. The success line is only
/// added when no file was rejected.
pub(crate) struct Upload;

impl ActionHandler for Upload {
    fn handle(&self, ctx: &ActionContext<'_>, request: ValidatedRequest) -> Report {
        let mut report = Report::default();

        for mut file in request.files {
            match upload_one(ctx, &request.target, &mut file) {
                Ok(()) => {
                    tracing::info!(name = %file.name, dir = %request.target, "File uploaded");
                }
                Err(err) => report.push_error(err),
            }
        }

        if report.is_empty() {
            report.push_success(UPLOAD_SUCCESS);
        }
        report
    }
}

fn upload_one(
    ctx: &ActionContext<'_>,
    target: &RelativePath,
    file: &mut UploadedFile,
) -> Result<(), ActionError> {
    let policy = ctx.policy;
    let name = file.name.clone();

    validate_file_name(&name).map_err(|_| ValidationError::InvalidUploadName(name.clone()))?;

    if file.declared_size > policy.max_file_size_bytes {
        return Err(PolicyViolation::FileTooLarge {
            limit_kb: policy.max_file_size_kb(),
            name,
        }
        .into());
    }

    if policy.check_space {
        let used = quota::subtree_size(ctx.root.base_path());
        if used.saturating_add(file.declared_size) > policy.max_space_bytes {
            return Err(PolicyViolation::SpaceExceeded {
                limit_kb: policy.max_space_kb(),
                name,
            }
            .into());
        }
    }

    match policy.check_extension(&name) {
        ExtensionCheck::Allowed => {}
        ExtensionCheck::Missing => return Err(PolicyViolation::MissingExtension { name }.into()),
        ExtensionCheck::Rejected(ext) => {
            return Err(PolicyViolation::ExtensionNotAllowed { ext, name }.into())
        }
    }

    // spaces are stored as underscores
    let stored_name = name.replace(' ', "_");
    let dir = ctx.root.resolve(target);
    store(ctx, &dir, &stored_name, file.reader.as_mut(), &name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::test_support::*;
    use crate::action::{ActionKind, ActionRequest};
    use crate::file::{ExtensionPolicy, Policy};
    use std::fs;
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn upload(files: Vec<UploadedFile>) -> ActionRequest {
        files
            .into_iter()
            .fold(ActionRequest::new(ActionKind::Upload, "/").directory(), |req, f| {
                req.with_file(f)
            })
    }

    /// Reader that records whether it was ever read.
    struct Tattletale(Arc<AtomicBool>);

    impl Read for Tattletale {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.0.store(true, Ordering::SeqCst);
            Ok(0)
        }
    }

    #[test]
    fn test_upload_single_file() {
        let (dir, engine) = engine();

        let report = engine.execute(upload(vec![UploadedFile::from_bytes("a.txt", "hello")]));

        assert_eq!(report.texts(), vec![UPLOAD_SUCCESS]);
        assert!(report.succeeded());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_upload_into_subdirectory() {
        let (dir, engine) = engine();
        mkdir(dir.path(), "docs");

        let request = ActionRequest::new(ActionKind::Upload, "/docs/")
            .directory()
            .with_file(UploadedFile::from_bytes("a.txt", "x"));
        let report = engine.execute(request);

        assert!(report.succeeded());
        assert!(dir.path().join("docs/a.txt").exists());
    }

    #[test]
    fn test_upload_collision_gets_numbered_name() {
        let (dir, engine) = engine();
        write(dir.path(), "a.txt", b"old");

        let report = engine.execute(upload(vec![UploadedFile::from_bytes("a.txt", "new")]));

        assert!(report.succeeded());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(dir.path().join("a.0.txt")).unwrap(), "new");
    }

    #[test]
    fn test_upload_replaces_spaces() {
        let (dir, engine) = engine();

        let report = engine.execute(upload(vec![UploadedFile::from_bytes("my notes.txt", "x")]));

        assert!(report.succeeded());
        assert!(dir.path().join("my_notes.txt").exists());
    }

    #[test]
    fn test_oversized_declared_upload_writes_nothing() {
        let policy = Policy {
            max_file_size_bytes: 1024,
            ..Policy::default()
        };
        let (dir, engine) = engine_with(policy);
        let touched = Arc::new(AtomicBool::new(false));

        let report = engine.execute(upload(vec![UploadedFile::new(
            "big.bin",
            4096,
            Tattletale(touched.clone()),
        )]));

        assert_eq!(report.texts(), vec!["File size exceeded 1 KB : big.bin"]);
        assert!(!touched.load(Ordering::SeqCst));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_space_quota() {
        let policy = Policy {
            max_space_bytes: 10,
            ..Policy::default()
        };
        let (dir, engine) = engine_with(policy);
        write(dir.path(), "existing.bin", &[0u8; 8]);

        let report = engine.execute(upload(vec![UploadedFile::from_bytes("a.bin", vec![0u8; 3])]));

        assert_eq!(report.texts(), vec!["Total Space size exceeded 0 KB : a.bin"]);
        assert!(!dir.path().join("a.bin").exists());
    }

    #[test]
    fn test_space_quota_disabled() {
        let policy = Policy {
            max_space_bytes: 10,
            check_space: false,
            ..Policy::default()
        };
        let (dir, engine) = engine_with(policy);
        write(dir.path(), "existing.bin", &[0u8; 8]);

        let report = engine.execute(upload(vec![UploadedFile::from_bytes("a.bin", vec![0u8; 3])]));

        assert!(report.succeeded());
    }

    #[test]
    fn test_extension_policy() {
        let policy = Policy {
            extensions: ExtensionPolicy::only(["txt"]),
            ..Policy::default()
        };
        let (dir, engine) = engine_with(policy);

        let report = engine.execute(upload(vec![
            UploadedFile::from_bytes("run.exe", "x"),
            UploadedFile::from_bytes("README", "x"),
        ]));

        assert_eq!(
            report.texts(),
            vec![
                "File extension not allowed (.exe) : run.exe",
                "No file extension in uploaded file : README",
            ]
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_partial_success_keeps_order() {
        let (dir, engine) = engine();

        let report = engine.execute(upload(vec![
            UploadedFile::from_bytes("good1.txt", "1"),
            UploadedFile::from_bytes("bad..txt", "2"),
            UploadedFile::from_bytes("good2.txt", "3"),
            UploadedFile::from_bytes("bad/slash.txt", "4"),
        ]));

        assert_eq!(
            report.texts(),
            vec![
                "File name is not valid : bad..txt",
                "File name is not valid : bad/slash.txt"
            ]
        );
        assert!(!report.succeeded());
        assert!(dir.path().join("good1.txt").exists());
        assert!(dir.path().join("good2.txt").exists());
    }

    #[test]
    fn test_upload_to_missing_directory() {
        let (_dir, engine) = engine();

        let request = ActionRequest::new(ActionKind::Upload, "/missing/")
            .directory()
            .with_file(UploadedFile::from_bytes("a.txt", "x"));
        let report = engine.execute(request);

        assert_eq!(report.texts(), vec!["File couldn't be saved : a.txt"]);
    }

    #[test]
    fn test_upload_without_files_reports_success() {
        let (_dir, engine) = engine();

        let report = engine.execute(upload(Vec::new()));

        assert_eq!(report.texts(), vec![UPLOAD_SUCCESS]);
    }
}
