//! Backing-store read traits
//!
//! The access engine reads content files through a small read-only storage
//! interface. Implementations decide where bytes actually live; the engine
//! only ever opens and stats paths resolved from the index.
//!
//! ## Implementations
//!
//! - `FileStorage`: local directory via `tokio::fs`
//! - `MemoryStorage`: in-memory map, for tests and fixtures
//!
//! Remote backends (S3, HTTP) implement the same trait out of tree; nothing
//! in the engine depends on backend specifics.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tokio::io::AsyncRead;

/// File metadata returned by [`StorageRead::stat_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// File size in bytes
    pub size: u64,
    /// Last-modified time
    pub modified: DateTime<Utc>,
}

/// Read-only access to content files in a backing store
///
/// Paths are slash-separated and relative to the store's base. A missing
/// path maps to `Error::NotFound`; any other failure is `Error::Storage`.
#[async_trait]
pub trait StorageRead: Debug + Send + Sync {
    /// Readable handle type returned by `open_file`
    type File: AsyncRead + Send + Unpin;

    /// Open the file at the given path for reading
    async fn open_file(&self, path: &str) -> Result<Self::File>;

    /// Return size and modification time for the file at the given path
    async fn stat_file(&self, path: &str) -> Result<FileMeta>;
}

/// Map an I/O failure at `path` to the core error taxonomy.
///
/// `NotFound` is a first-class sentinel; everything else is a storage error
/// with the path attached for logging.
pub fn io_error(path: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::not_found(format!("file {path:?}"))
    } else {
        Error::storage(format!("{path:?}: {err}"))
    }
}

// ============================================================================
// FileStorage
// ============================================================================

/// Local-directory storage backend
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: std::path::PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at the given directory
    pub fn new(base_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory for this storage
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> std::path::PathBuf {
        let mut full = self.base_path.clone();
        full.extend(path.split('/'));
        full
    }
}

#[async_trait]
impl StorageRead for FileStorage {
    type File = tokio::fs::File;

    async fn open_file(&self, path: &str) -> Result<Self::File> {
        tokio::fs::File::open(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn stat_file(&self, path: &str) -> Result<FileMeta> {
        let meta = tokio::fs::metadata(self.full_path(path))
            .await
            .map_err(|e| io_error(path, e))?;
        if meta.is_dir() {
            return Err(Error::not_found(format!("file {path:?}")));
        }
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| io_error(path, e))?;
        Ok(FileMeta {
            size: meta.len(),
            modified,
        })
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// A simple in-memory storage for tests
///
/// Stores file bytes in a HashMap with interior mutability (via
/// `Arc<RwLock<...>>`) so fixtures can insert while the engine reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<HashMap<String, MemoryFile>>>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

impl MemoryStorage {
    /// Create a new empty memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert file bytes at the given path
    ///
    /// Note: takes `&self` (not `&mut self`) due to interior mutability.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.write().expect("RwLock poisoned").insert(
            path.into(),
            MemoryFile {
                bytes: bytes.into(),
                modified: Utc::now(),
            },
        );
    }

    /// Remove the file at the given path, if present
    pub fn remove(&self, path: &str) {
        self.files.write().expect("RwLock poisoned").remove(path);
    }
}

#[async_trait]
impl StorageRead for MemoryStorage {
    type File = std::io::Cursor<Vec<u8>>;

    async fn open_file(&self, path: &str) -> Result<Self::File> {
        self.files
            .read()
            .expect("RwLock poisoned")
            .get(path)
            .map(|f| std::io::Cursor::new(f.bytes.clone()))
            .ok_or_else(|| Error::not_found(format!("file {path:?}")))
    }

    async fn stat_file(&self, path: &str) -> Result<FileMeta> {
        self.files
            .read()
            .expect("RwLock poisoned")
            .get(path)
            .map(|f| FileMeta {
                size: f.bytes.len() as u64,
                modified: f.modified,
            })
            .ok_or_else(|| Error::not_found(format!("file {path:?}")))
    }
}
