//! Error types for package scaffolding

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while describing, generating or registering a package
#[derive(Debug, Error)]
pub enum PackagerError {
    /// Package name is not of the form `<vendor>/<project>`
    #[error("Invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Namespace prefix with characters a namespace cannot hold
    #[error("Invalid namespace '{0}': it can only contain letters, numbers and backslashes")]
    InvalidNamespace(String),

    /// Target location already holds a package
    #[error("Package '{0}' already exists")]
    AlreadyExists(String),

    /// Resource tag with no layout rule
    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    /// `@package` directive referencing a field the descriptor does not have
    #[error("Unknown package field: {0}")]
    LookupError(String),

    /// Version string that cannot be read as `MAJOR.MINOR`
    #[error("Invalid version '{0}': expected MAJOR.MINOR")]
    InvalidVersion(String),

    /// Path that cannot be resolved
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Malformed callback expression or wrong number of arguments
    #[error("Invalid callback '{expression}': {reason}")]
    InvalidCallback { expression: String, reason: String },

    /// Callback calls a function missing from the registry
    #[error("Unknown template function: {0}")]
    UnknownFunction(String),

    /// Imports nested too deeply (most likely a cycle)
    #[error("Import of '{0}' exceeds the maximum nesting depth")]
    ImportDepthExceeded(String),

    /// Directory or file operation failure
    #[error("I/O failure at {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// JSON manifest could not be parsed or written
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl PackagerError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}

/// Result type for packager operations
pub type Result<T> = std::result::Result<T, PackagerError>;
