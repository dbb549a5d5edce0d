//! Remote object store error types.

use thiserror::Error;

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur while talking to the object store.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid response ({status}) during {context}")]
    InvalidResponse { status: u16, context: String },

    #[error("auth token rejected: {0}")]
    Unauthorized(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("no authenticated session")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Returns true for failures a fresh session may cure.
    ///
    /// Dropped connections, unexpected status codes and rejected tokens are
    /// transient. Missing objects, bad credentials and local I/O are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Connection(_)
                | RemoteError::InvalidResponse { .. }
                | RemoteError::Unauthorized(_)
                | RemoteError::NotConnected
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::InvalidResponse {
                status: status.as_u16(),
                context: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
            }
        } else {
            // connect, timeout, request and body errors all mean the
            // exchange never completed
            RemoteError::Connection(e.to_string())
        }
    }
}
