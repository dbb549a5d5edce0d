//! Attachment storage error types.

use cloudfiles_client::RemoteError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the attachment storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
}
