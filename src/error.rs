//! Error types for provisioning operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the library.
///
/// Value loading never returns these: read and parse failures there are
/// logged and resolution carries on with what it has.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON root in {0} is not an object")]
    NotAnObject(PathBuf),

    #[error("malformed NDEF message: {0}")]
    Ndef(String),

    #[error("malformed properties text at line {line}: {reason}")]
    Properties { line: usize, reason: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid edit '{0}', expected FIELD=VALUE")]
    InvalidEdit(String),

    #[error("background load failed: {0}")]
    Background(String),
}

impl ProvisioningError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn ndef(reason: impl Into<String>) -> Self {
        Self::Ndef(reason.into())
    }
}

/// Result type for provisioning operations.
pub type ProvisioningResult<T> = std::result::Result<T, ProvisioningError>;
