//! Error types for ocfl-access-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (missing object, file, sidecar, directory)
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid logical path (absolute, empty, or containing `.`/`..` segments)
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Backing-store I/O failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Inventory read or parse failure from the OCFL collaborator
    #[error("inventory error: {0}")]
    Inventory(String),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Error::InvalidPath(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create an inventory error
    pub fn inventory(msg: impl Into<String>) -> Self {
        Error::Inventory(msg.into())
    }

    /// True if this error is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
