//! # OCFL Access Core
//!
//! Shared vocabulary for the OCFL access engine: errors, digest/path map
//! utilities, logical path validation, the backing-store read traits, and
//! the inventory-reader collaborator interface.
//!
//! ## Design Principles
//!
//! 1. **Read-only**: the engine never writes to the OCFL storage root
//! 2. **Async at I/O seams only**: map and digest work is synchronous
//! 3. **Collaborators behind traits**: OCFL parsing and the concrete
//!    backing filesystem are plug-replaceable

pub mod config;
pub mod digest;
pub mod error;
pub mod inventory;
pub mod path;
pub mod storage;

// Re-export main types
pub use config::{AccessConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_STAT_CONCURRENCY};
pub use digest::{DigestMap, PathMap};
pub use error::{Error, Result};
pub use inventory::{
    InventorySource, InventoryVersion, ObjectDeclaration, ObjectInventory, ObjectOptions,
    VersionUser,
};
pub use path::{join_paths, valid_path};
pub use storage::{io_error, FileMeta, FileStorage, MemoryStorage, StorageRead};
