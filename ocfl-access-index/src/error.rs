//! Error types for the index store

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Index store errors
#[derive(Error, Debug)]
pub enum IndexError {
    /// Row lookup found nothing (missing root, object, version, or path)
    #[error("not found: {0}")]
    NotFound(String),

    /// The object cannot be indexed as given (e.g. no versions)
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Index rows contradict the data model
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// Database driver error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("database migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl IndexError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        IndexError::NotFound(msg.into())
    }

    /// Create an invalid object error
    pub fn invalid_object(msg: impl Into<String>) -> Self {
        IndexError::InvalidObject(msg.into())
    }

    /// Create a corrupt index error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        IndexError::Corrupt(msg.into())
    }

    /// True if this error is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound(_))
    }
}
