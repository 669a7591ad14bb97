//! # OCFL Access API
//!
//! The public access service over an indexed OCFL storage root. Composes
//! the sync controller (lazy, sidecar-fingerprinted re-indexing with
//! single-flight de-duplication), the relational index store, the
//! concurrent content-size backfill, and the cross-version diff computer.
//!
//! A presentation layer drives everything through [`AccessService`]:
//!
//! ```ignore
//! use ocfl_access_api::AccessService;
//! use ocfl_access_core::{AccessConfig, FileStorage};
//! use ocfl_access_index::IndexStore;
//!
//! let index = IndexStore::open("access.db").await?;
//! let service = AccessService::new(source, storage, index, "main", AccessConfig::default());
//! let entries = service.read_version_dir("ark:123/abc", 0, ".").await?;
//! ```

mod diff;
mod error;
mod flight;
mod service;
mod sizes;
mod sync;

pub use diff::{ChangeKind, FileChange, VersionChanges};
pub use error::{AccessError, Result};
pub use service::{AccessService, Metrics};

// Re-export the vocabulary a presentation layer needs
pub use ocfl_access_core::{
    AccessConfig, DigestMap, FileMeta, FileStorage, InventorySource, InventoryVersion,
    MemoryStorage, ObjectDeclaration, ObjectInventory, ObjectOptions, PathMap, StorageRead,
    VersionUser,
};
pub use ocfl_access_index::{
    ContentFile, DirEntry, IndexStore, ObjectBrief, VersionBrief, VersionFile,
};
