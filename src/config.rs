//! Configuration module for fileman.

use serde::Deserialize;
use std::path::Path;

use crate::file::{ExtensionPolicy, Policy};
use crate::{FilemanError, Result};

/// Environment variable overriding `files.root`.
pub const ROOT_ENV: &str = "FILEMAN_ROOT";

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum size of one request body in megabytes.
    #[serde(default = "default_max_request_mb")]
    pub max_request_mb: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_request_mb() -> u64 {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_mb: default_max_request_mb(),
        }
    }
}

/// Managed directory and upload policy.
///
/// Sizes are in kilobytes, as they appear in messages.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Root directory all operations are confined to.
    #[serde(default = "default_root")]
    pub root: String,
    /// Maximum number of folders, root included.
    #[serde(default = "default_max_folders")]
    pub max_folders: usize,
    /// Maximum total size of the tree.
    #[serde(default = "default_max_space_kb")]
    pub max_space_kb: u64,
    /// Maximum size of one file.
    #[serde(default = "default_max_file_size_kb")]
    pub max_file_size_kb: u64,
    /// Allowed extensions without the dot. Absent means everything is allowed.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Enforce `max_space_kb`.
    #[serde(default = "default_true")]
    pub check_space: bool,
    /// Report usage to the UI.
    #[serde(default = "default_true")]
    pub show_space: bool,
    /// Re-check stored files by content when `extensions` is set.
    #[serde(default = "default_true")]
    pub verify_content_type: bool,
}

fn default_root() -> String {
    "data/files".to_string()
}

fn default_max_folders() -> usize {
    50
}

fn default_max_space_kb() -> u64 {
    5 * 1024
}

fn default_max_file_size_kb() -> u64 {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_folders: default_max_folders(),
            max_space_kb: default_max_space_kb(),
            max_file_size_kb: default_max_file_size_kb(),
            extensions: None,
            check_space: true,
            show_space: true,
            verify_content_type: true,
        }
    }
}

impl FilesConfig {
    /// Build the action policy.
    pub fn policy(&self) -> Policy {
        let extensions = match &self.extensions {
            Some(list) => ExtensionPolicy::only(list),
            None => ExtensionPolicy::Any,
        };
        Policy {
            max_folders: self.max_folders,
            max_space_bytes: self.max_space_kb.saturating_mul(1024),
            max_file_size_bytes: self.max_file_size_kb.saturating_mul(1024),
            extensions,
            check_space: self.check_space,
            verify_content_type: self.verify_content_type,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/fileman.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Managed directory and policy.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilemanError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FilemanError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEMAN_ROOT`: Override the managed root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            if !root.is_empty() {
                self.files.root = root;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The root path is empty
    /// - A limit is zero
    /// - An allowed extension is empty or contains a separator
    pub fn validate(&self) -> Result<()> {
        let files = &self.files;
        if files.root.trim().is_empty() {
            return Err(FilemanError::Config("files.root is empty".to_string()));
        }
        if files.max_folders == 0 {
            return Err(FilemanError::Config(
                "files.max_folders must be at least 1 (the root counts)".to_string(),
            ));
        }
        if files.max_file_size_kb == 0 || files.max_space_kb == 0 {
            return Err(FilemanError::Config(
                "files.max_file_size_kb and files.max_space_kb must be positive".to_string(),
            ));
        }
        if let Some(extensions) = &files.extensions {
            for ext in extensions {
                let bare = ext.trim_start_matches('.');
                if bare.is_empty() || bare.contains(['/', '\\', '.']) {
                    return Err(FilemanError::Config(format!(
                        "invalid entry in files.extensions: {ext:?}"
                    )));
                }
            }
        }
        if self.server.max_request_mb == 0 {
            return Err(FilemanError::Config(
                "server.max_request_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
