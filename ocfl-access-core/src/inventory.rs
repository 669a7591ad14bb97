//! OCFL inventory collaborator interface
//!
//! The engine never parses `inventory.json` itself. An [`InventorySource`]
//! implementation (backed by a real OCFL parser) supplies object identity,
//! the manifest, and per-version state; the engine only indexes and queries
//! what it is given.

use crate::digest::DigestMap;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Options for reading an object through the collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectOptions {
    /// Fail with NotFound when the object's root inventory is absent
    pub must_exist: bool,
    /// Tolerate a root sidecar that doesn't match the inventory (an object
    /// mid-update is still readable; the sync protocol re-checks later)
    pub skip_root_sidecar_validation: bool,
}

impl ObjectOptions {
    /// The option set used by the sync controller: the object must exist and
    /// staging-time sidecar mismatches are tolerated.
    pub fn for_indexing() -> Self {
        Self {
            must_exist: true,
            skip_root_sidecar_validation: true,
        }
    }
}

/// An object declaration found by scanning a storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDeclaration {
    /// Path of the declared object's root directory, relative to the
    /// backing store
    pub object_path: String,
}

/// A version's user attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUser {
    pub name: String,
    pub address: String,
}

/// One version from an object's root inventory
#[derive(Debug, Clone)]
pub struct InventoryVersion {
    /// Logical state: digest to logical paths
    pub state: DigestMap,
    /// Version message (may be empty)
    pub message: String,
    /// Who created the version, if recorded
    pub user: Option<VersionUser>,
    /// When the version was created
    pub created: DateTime<Utc>,
}

/// Everything the index needs from an object's root inventory
#[derive(Debug, Clone)]
pub struct ObjectInventory {
    /// The object's unique identifier
    pub id: String,
    /// Path of the object root, relative to the backing store
    pub storage_path: String,
    /// Zero-padding width of the object's version numbering scheme
    pub version_padding: u32,
    /// Digest algorithm of the root inventory (e.g. "sha512")
    pub digest_algorithm: String,
    /// Digest of the root inventory, as recorded in its sidecar
    pub inventory_digest: String,
    /// Manifest: content digest to content paths relative to the object root
    pub manifest: DigestMap,
    /// Versions in order; index 0 is v1, the last entry is head
    pub versions: Vec<InventoryVersion>,
}

impl ObjectInventory {
    /// The object's head version number
    pub fn head(&self) -> u32 {
        self.versions.len() as u32
    }
}

/// Read access to an OCFL storage root through the parser collaborator
#[async_trait]
pub trait InventorySource: Debug + Send + Sync {
    /// Scan the storage root for object declarations.
    ///
    /// # Warning
    ///
    /// This lists every object in the root and can be expensive on remote
    /// backends. Use only for full-root reconciliation.
    async fn declarations(&self) -> Result<Vec<ObjectDeclaration>>;

    /// Read the root inventory sidecar for the object at `object_path`.
    ///
    /// Returns the digest string recorded in the sidecar. NotFound when the
    /// sidecar doesn't exist.
    async fn inventory_sidecar(&self, object_path: &str, algorithm: &str) -> Result<String>;

    /// Read the full root inventory for the object with the given ID
    async fn object_by_id(&self, id: &str, opts: ObjectOptions) -> Result<ObjectInventory>;

    /// Read the full root inventory for the object rooted at `object_path`
    /// (used by root scans, which discover paths before IDs)
    async fn object_at_path(&self, object_path: &str, opts: ObjectOptions)
        -> Result<ObjectInventory>;
}
