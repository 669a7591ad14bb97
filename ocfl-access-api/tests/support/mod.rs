//! Test fixture: an in-memory OCFL storage root
//!
//! `FixtureRoot` plays both collaborators the service needs: it hands out
//! inventories like an OCFL parser and serves content bytes like a backing
//! store. Objects are described as lists of version states (path →
//! content); manifests, digests, content paths, and sidecar fingerprints
//! are derived the way a real storage root would lay them out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocfl_access_api::{AccessConfig, AccessService, IndexStore, MemoryStorage};
use ocfl_access_core::{
    join_paths, DigestMap, Error, InventorySource, InventoryVersion, ObjectDeclaration,
    ObjectInventory, ObjectOptions, Result, VersionUser,
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

const CREATED_BASE: i64 = 1_700_000_000;

/// Hex SHA-256 of file content, matching what the fixture records in
/// manifests and states.
pub fn content_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Created timestamp for version `vnum` of every fixture object
pub fn version_created(vnum: usize) -> DateTime<Utc> {
    DateTime::from_timestamp(CREATED_BASE + vnum as i64 * 86_400, 0).unwrap()
}

#[derive(Debug, Default)]
pub struct FixtureRoot {
    objects: RwLock<HashMap<String, ObjectInventory>>,
    sidecars: RwLock<HashMap<String, String>>,
    storage: MemoryStorage,
    inventory_reads: AtomicUsize,
    sidecar_reads: AtomicUsize,
}

impl FixtureRoot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The backing store the fixture's content bytes live in
    pub fn storage(&self) -> MemoryStorage {
        self.storage.clone()
    }

    /// Number of full inventory reads the service has performed
    pub fn inventory_reads(&self) -> usize {
        self.inventory_reads.load(Ordering::SeqCst)
    }

    /// Number of sidecar reads the service has performed
    pub fn sidecar_reads(&self) -> usize {
        self.sidecar_reads.load(Ordering::SeqCst)
    }

    /// Create or replace an object from its full version history. Each
    /// version is a list of (logical path, content) pairs.
    pub fn put_object(&self, id: &str, versions: &[&[(&str, &str)]]) {
        let storage_path = format!(
            "objects/{}",
            id.replace(|c: char| !c.is_ascii_alphanumeric(), "-")
        );
        let mut manifest = DigestMap::new();
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut inventory_versions = Vec::new();
        for (i, files) in versions.iter().enumerate() {
            let vnum = i + 1;
            let mut state = DigestMap::new();
            for (path, content) in files.iter() {
                let digest = content_digest(content);
                if !seen.contains_key(&digest) {
                    let content_path = format!("v{vnum}/content/{path}");
                    self.storage.insert(
                        join_paths(&storage_path, &content_path),
                        content.as_bytes().to_vec(),
                    );
                    manifest.insert(digest.clone(), content_path.clone());
                    seen.insert(digest.clone(), content_path);
                }
                state.insert(digest, *path);
            }
            inventory_versions.push(InventoryVersion {
                state,
                message: format!("version {vnum}"),
                user: Some(VersionUser {
                    name: "somebody".to_string(),
                    address: "mailto:somebody@example.org".to_string(),
                }),
                created: version_created(vnum),
            });
        }
        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(id.as_bytes());
            for ver in &inventory_versions {
                hasher.update(ver.state.state_digest().as_bytes());
            }
            hex::encode(hasher.finalize())
        };
        let inventory = ObjectInventory {
            id: id.to_string(),
            storage_path: storage_path.clone(),
            version_padding: 0,
            digest_algorithm: "sha256".to_string(),
            inventory_digest: fingerprint.clone(),
            manifest,
            versions: inventory_versions,
        };
        self.sidecars
            .write()
            .unwrap()
            .insert(storage_path, fingerprint);
        self.objects
            .write()
            .unwrap()
            .insert(id.to_string(), inventory);
    }

    /// Drop the object's inventory and sidecar, as if it were removed from
    /// the storage root
    pub fn remove_object(&self, id: &str) {
        if let Some(inv) = self.objects.write().unwrap().remove(id) {
            self.sidecars.write().unwrap().remove(&inv.storage_path);
        }
    }
}

#[async_trait]
impl InventorySource for FixtureRoot {
    async fn declarations(&self) -> Result<Vec<ObjectDeclaration>> {
        let mut paths: Vec<String> = self
            .objects
            .read()
            .unwrap()
            .values()
            .map(|inv| inv.storage_path.clone())
            .collect();
        paths.sort();
        Ok(paths
            .into_iter()
            .map(|object_path| ObjectDeclaration { object_path })
            .collect())
    }

    async fn inventory_sidecar(&self, object_path: &str, _algorithm: &str) -> Result<String> {
        self.sidecar_reads.fetch_add(1, Ordering::SeqCst);
        self.sidecars
            .read()
            .unwrap()
            .get(object_path)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("sidecar at {object_path:?}")))
    }

    async fn object_by_id(&self, id: &str, _opts: ObjectOptions) -> Result<ObjectInventory> {
        self.inventory_reads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("object {id:?}")))
    }

    async fn object_at_path(
        &self,
        object_path: &str,
        _opts: ObjectOptions,
    ) -> Result<ObjectInventory> {
        self.inventory_reads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .unwrap()
            .values()
            .find(|inv| inv.storage_path == object_path)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("object at {object_path:?}")))
    }
}

/// A service over a fresh in-memory index database
pub async fn service(
    fixture: &Arc<FixtureRoot>,
    config: AccessConfig,
) -> AccessService<FixtureRoot, MemoryStorage> {
    let index = IndexStore::open("sqlite::memory:")
        .await
        .expect("opening in-memory index");
    AccessService::new(
        Arc::clone(fixture),
        Arc::new(fixture.storage()),
        index,
        "test-root",
        config,
    )
}

/// A config with an hour-long refresh window, so repeated syncs within one
/// test always take the soft-fresh path
pub fn long_refresh() -> AccessConfig {
    AccessConfig {
        refresh_interval: std::time::Duration::from_secs(3600),
        ..AccessConfig::default()
    }
}

/// A config that re-checks the sidecar on every sync
pub fn zero_refresh() -> AccessConfig {
    AccessConfig {
        refresh_interval: std::time::Duration::ZERO,
        ..AccessConfig::default()
    }
}
