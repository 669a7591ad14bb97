//! The public access service
//!
//! `AccessService` composes the sync controller and the index store into
//! the query surface consumed by a presentation layer: object summaries,
//! version history, directory listings, file stat/open, and version diffs.
//! Every operation implicitly syncs the object first, so results are never
//! staler than the configured refresh interval.

use crate::diff::{self, VersionChanges};
use crate::error::{AccessError, Result};
use crate::flight::FlightGroup;
use ocfl_access_core::{
    join_paths, valid_path, AccessConfig, InventorySource, StorageRead,
};
use ocfl_access_index::{DirEntry, IndexStore, ObjectBrief, VersionBrief, VersionFile};
use serde::Serialize;
use std::sync::Arc;

/// Counts for indexed objects in a storage root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub num_objects: i64,
}

/// Read-only access to one indexed OCFL storage root.
///
/// Safe for concurrent callers; clones of the inner handles are cheap and
/// shared. `R` is the OCFL parser collaborator, `F` the backing store the
/// content files are read from.
pub struct AccessService<R, F> {
    source: Arc<R>,
    storage: Arc<F>,
    index: IndexStore,
    root_name: String,
    config: AccessConfig,
    pub(crate) object_flights: FlightGroup<ObjectBrief>,
    pub(crate) root_flights: FlightGroup<()>,
}

impl<R: InventorySource, F: StorageRead> AccessService<R, F> {
    /// Create a service for the storage root indexed under `root_name`
    pub fn new(
        source: Arc<R>,
        storage: Arc<F>,
        index: IndexStore,
        root_name: impl Into<String>,
        config: AccessConfig,
    ) -> Self {
        Self {
            source,
            storage,
            index,
            root_name: root_name.into(),
            config,
            object_flights: FlightGroup::new(),
            root_flights: FlightGroup::new(),
        }
    }

    /// The name this storage root is indexed under
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// The underlying index store
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// The backing store content is read from
    pub fn storage(&self) -> &F {
        &self.storage
    }

    /// The OCFL parser collaborator
    pub(crate) fn source(&self) -> &R {
        &self.source
    }

    /// The service configuration
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Ordered version summaries, v1 through head
    pub async fn list_versions(&self, object_id: &str) -> Result<Vec<VersionBrief>> {
        self.sync_object(object_id).await?;
        Ok(self.index.list_versions(&self.root_name, object_id).await?)
    }

    /// Metadata for one version. `vnum` 0 means head.
    pub async fn get_version_info(&self, object_id: &str, vnum: u32) -> Result<VersionBrief> {
        let (_, vnum) = self.sync_check_version(object_id, vnum).await?;
        Ok(self
            .index
            .get_version(&self.root_name, object_id, vnum)
            .await?)
    }

    /// Directory entries for `dir` in the version's logical state. `vnum` 0
    /// means head; `dir` `"."` (or empty) is the root directory.
    pub async fn read_version_dir(
        &self,
        object_id: &str,
        vnum: u32,
        dir: &str,
    ) -> Result<Vec<DirEntry>> {
        let dir = if dir.is_empty() { "." } else { dir };
        if !valid_path(dir) {
            return Err(AccessError::invalid_path(dir));
        }
        let (_, vnum) = self.sync_check_version(object_id, vnum).await?;
        Ok(self
            .index
            .read_version_dir(&self.root_name, object_id, vnum, dir)
            .await?)
    }

    /// File information for a live file in the version's logical state.
    /// `vnum` 0 means head.
    pub async fn stat_version_file(
        &self,
        object_id: &str,
        vnum: u32,
        path: &str,
    ) -> Result<VersionFile> {
        if !valid_path(path) || path == "." {
            return Err(AccessError::invalid_path(path));
        }
        let (_, vnum) = self.sync_check_version(object_id, vnum).await?;
        Ok(self
            .index
            .stat_version_file(&self.root_name, object_id, vnum, path)
            .await?)
    }

    /// Open a file from the version's logical state for reading. Returns
    /// the readable handle together with the file's stat information.
    ///
    /// The physical read goes through the backing store at the content path
    /// resolved from the index.
    pub async fn open_version_file(
        &self,
        object_id: &str,
        vnum: u32,
        path: &str,
    ) -> Result<(F::File, VersionFile)> {
        if !valid_path(path) || path == "." {
            return Err(AccessError::invalid_path(path));
        }
        let (brief, vnum) = self.sync_check_version(object_id, vnum).await?;
        let info = self
            .index
            .stat_version_file(&self.root_name, object_id, vnum, path)
            .await?;
        let full_path = join_paths(&brief.storage_path, &info.content_path);
        let file = self.storage.open_file(&full_path).await?;
        Ok((file, info))
    }

    /// File-level changes between two versions. `from_vnum` 0 means
    /// "before version 1", so everything in `to_vnum` reports as Added.
    pub async fn get_version_changes(
        &self,
        object_id: &str,
        from_vnum: u32,
        to_vnum: u32,
    ) -> Result<VersionChanges> {
        if to_vnum < 1 {
            return Err(AccessError::invalid_version(format!(
                "to version must be 1 or greater, got {to_vnum}"
            )));
        }
        self.sync_object(object_id).await?;
        diff::version_changes(&self.index, &self.root_name, object_id, from_vnum, to_vnum).await
    }

    /// One page of object summaries under this root
    pub async fn list_objects(&self, limit: i64, offset: i64) -> Result<Vec<ObjectBrief>> {
        Ok(self
            .index
            .list_objects(&self.root_name, limit, offset)
            .await?)
    }

    /// Counts for this storage root
    pub async fn metrics(&self) -> Result<Metrics> {
        Ok(Metrics {
            num_objects: self.index.count_objects(&self.root_name).await?,
        })
    }
}
