//! Error taxonomy for the access service
//!
//! NotFound is a first-class sentinel: lower layers attach context (object
//! id, version, path) to the message, and the sentinel survives every
//! conversion so the presentation layer can map it to 404. Everything else
//! classifies into bad-request, backing-store, or database failures.

use ocfl_access_index::IndexError;
use thiserror::Error;

/// Result type alias for access-service operations
pub type Result<T> = std::result::Result<T, AccessError>;

/// Access service errors
#[derive(Error, Debug)]
pub enum AccessError {
    /// Missing root, object, version, path, or storage path
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid logical path (absolute, empty, or non-canonical)
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Invalid version reference
    #[error("invalid version reference: {0}")]
    InvalidVersion(String),

    /// Backing-store or inventory collaborator failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Index store failure
    #[error(transparent)]
    Index(IndexError),

    /// A coalesced sync failed in the elected leader
    #[error("sync failed: {0}")]
    Sync(String),
}

impl AccessError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AccessError::NotFound(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        AccessError::InvalidPath(msg.into())
    }

    /// Create an invalid version error
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        AccessError::InvalidVersion(msg.into())
    }

    /// True if this error is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound(_))
    }
}

impl From<IndexError> for AccessError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotFound(msg) => AccessError::NotFound(msg),
            other => AccessError::Index(other),
        }
    }
}

impl From<ocfl_access_core::Error> for AccessError {
    fn from(err: ocfl_access_core::Error) -> Self {
        match err {
            ocfl_access_core::Error::NotFound(msg) => AccessError::NotFound(msg),
            ocfl_access_core::Error::InvalidPath(msg) => AccessError::InvalidPath(msg),
            other => AccessError::Storage(other.to_string()),
        }
    }
}
