//! Error types for fileman.

use thiserror::Error;

/// Common error type for fileman.
///
/// Used by configuration, logging, the root directory and download code.
/// Mutating actions never surface this type; they report through
/// [`crate::action::ActionError`] instead.
#[derive(Error, Debug)]
pub enum FilemanError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Archive could not be read or written.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for FilemanError {
    fn from(e: zip::result::ZipError) -> Self {
        FilemanError::Archive(e.to_string())
    }
}

impl From<crate::file::ValidationError> for FilemanError {
    fn from(e: crate::file::ValidationError) -> Self {
        FilemanError::Validation(e.to_string())
    }
}

/// Result type alias for fileman operations.
pub type Result<T> = std::result::Result<T, FilemanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = FilemanError::Validation("bad name".to_string());
        assert_eq!(err.to_string(), "validation error: bad name");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = FilemanError::NotFound("/docs/a.txt".to_string());
        assert_eq!(err.to_string(), "/docs/a.txt not found");
    }

    #[test]
    fn test_config_error_display() {
        let err = FilemanError::Config("root is not a directory".to_string());
        assert_eq!(err.to_string(), "configuration error: root is not a directory");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FilemanError = io_err.into();
        assert!(matches!(err, FilemanError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_path_validation_conversion() {
        let err: FilemanError = crate::file::ValidationError::InvalidPath("../x".to_string()).into();
        assert!(matches!(err, FilemanError::Validation(_)));
        assert!(err.to_string().contains("Invalid path : ../x"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(FilemanError::Archive("truncated".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
