//! The sync controller
//!
//! Keeps indexed objects coherent with the backing store. The protocol, per
//! object:
//!
//! 1. A brief indexed within the refresh interval is served as-is.
//! 2. Otherwise callers join a single-flight group keyed by the object ID;
//!    the elected leader reconciles, everyone else receives its result.
//! 3. The leader reads the inventory sidecar first: an unchanged digest
//!    means the object didn't change, and only `indexed_at` is bumped.
//! 4. A changed (or unreadable) sidecar triggers a full inventory read and
//!    an atomic re-index, followed by the content-size backfill.
//! 5. A missing inventory removes the object from the index and reports
//!    NotFound.

use crate::error::{AccessError, Result};
use crate::service::AccessService;
use chrono::Utc;
use ocfl_access_core::{InventorySource, ObjectInventory, ObjectOptions, StorageRead};
use ocfl_access_index::ObjectBrief;

impl<R: InventorySource, F: StorageRead> AccessService<R, F> {
    /// Reconcile the object against the backing store if needed and return
    /// its summary.
    ///
    /// Under concurrent callers, at most one reconciliation pass runs per
    /// object, and at most one full inventory read happens per refresh
    /// window. NotFound means the object exists neither in the index nor in
    /// the backing store.
    pub async fn sync_object(&self, object_id: &str) -> Result<ObjectBrief> {
        if let Some(brief) = self.lookup_brief(object_id).await? {
            if self.is_fresh(&brief) {
                return Ok(brief);
            }
        }
        let key = format!("obj:{object_id}");
        self.object_flights
            .run(&key, || self.reindex_object(object_id))
            .await
    }

    /// Reconcile every object declared in the backing store.
    ///
    /// Duplicate concurrent calls coalesce onto one scan. Per-object
    /// failures are logged and skipped; the scan continues.
    pub async fn index_root(&self) -> Result<()> {
        let key = self.root_name().to_string();
        self.root_flights.run(&key, || self.scan_root()).await
    }

    /// Sync and resolve a version reference: 0 becomes head, anything above
    /// head is NotFound.
    pub(crate) async fn sync_check_version(
        &self,
        object_id: &str,
        vnum: u32,
    ) -> Result<(ObjectBrief, u32)> {
        let brief = self.sync_object(object_id).await?;
        let resolved = if vnum < 1 { brief.head } else { vnum };
        if resolved > brief.head {
            return Err(AccessError::not_found(format!(
                "object {object_id:?} version v{resolved}"
            )));
        }
        Ok((brief, resolved))
    }

    async fn lookup_brief(&self, object_id: &str) -> Result<Option<ObjectBrief>> {
        match self.index().object_brief(self.root_name(), object_id).await {
            Ok(brief) => Ok(Some(brief)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn is_fresh(&self, brief: &ObjectBrief) -> bool {
        let elapsed = Utc::now().signed_duration_since(brief.indexed_at);
        match elapsed.to_std() {
            Ok(elapsed) => elapsed < self.config().refresh_interval,
            // indexed_at in the future (clock skew between replicas)
            Err(_) => true,
        }
    }

    /// Leader body for one object, looked up by ID.
    ///
    /// Re-reads the brief under the flight: a caller that raced a finished
    /// leader finds the fresh brief here instead of triggering another
    /// inventory read. A stale brief's inventory digest is compared against
    /// the sidecar to decide whether a full re-index is needed.
    async fn reindex_object(&self, object_id: &str) -> Result<ObjectBrief> {
        let prev = self.lookup_brief(object_id).await?;
        if let Some(prev) = &prev {
            if self.is_fresh(prev) {
                return Ok(prev.clone());
            }
            if let Some(brief) = self.touch_if_unchanged(prev).await? {
                return Ok(brief);
            }
        }
        tracing::debug!(object_id, "indexing object from root inventory");
        let inv = match self
            .source()
            .object_by_id(object_id, ObjectOptions::for_indexing())
            .await
        {
            Ok(inv) => inv,
            Err(err) if err.is_not_found() => {
                // gone from the backing store: drop the stale index row
                self.index().unset_object(self.root_name(), object_id).await?;
                return Err(AccessError::not_found(format!("object {object_id:?}")));
            }
            Err(err) => return Err(err.into()),
        };
        self.finish_reindex(inv).await
    }

    /// Leader body for one object, looked up by storage path (root scans
    /// discover paths before they know IDs).
    async fn reindex_object_path(
        &self,
        object_path: &str,
        prev: Option<ObjectBrief>,
    ) -> Result<ObjectBrief> {
        if let Some(prev) = &prev {
            if let Some(brief) = self.touch_if_unchanged(prev).await? {
                return Ok(brief);
            }
        }
        tracing::debug!(storage_path = object_path, "indexing object from root inventory");
        let inv = match self
            .source()
            .object_at_path(object_path, ObjectOptions::for_indexing())
            .await
        {
            Ok(inv) => inv,
            Err(err) if err.is_not_found() => {
                if let Some(prev) = &prev {
                    self.index().unset_object(self.root_name(), &prev.id).await?;
                }
                return Err(AccessError::not_found(format!(
                    "object at {object_path:?}"
                )));
            }
            Err(err) => return Err(err.into()),
        };
        self.finish_reindex(inv).await
    }

    /// Compare the inventory sidecar against the stored digest; when they
    /// match the object is unchanged and only `indexed_at` moves.
    async fn touch_if_unchanged(&self, prev: &ObjectBrief) -> Result<Option<ObjectBrief>> {
        match self
            .source()
            .inventory_sidecar(&prev.storage_path, &prev.digest_algorithm)
            .await
        {
            Ok(sidecar) if sidecar == prev.inventory_digest => {
                tracing::info!(object_id = %prev.id, "object unchanged");
                let brief = self.index().touch_object(self.root_name(), &prev.id).await?;
                Ok(Some(brief))
            }
            Ok(_) => Ok(None),
            Err(err) => {
                tracing::error!(object_id = %prev.id, error = %err, "reading inventory sidecar");
                Ok(None)
            }
        }
    }

    async fn finish_reindex(&self, inv: ObjectInventory) -> Result<ObjectBrief> {
        self.index().set_object(self.root_name(), &inv).await?;
        // size-unknown is a legal index state: a failed backfill is logged,
        // not surfaced
        if let Err(err) = self.backfill_sizes(&inv).await {
            tracing::warn!(object_id = %inv.id, error = %err, "content size backfill failed");
        }
        Ok(self.index().object_brief(self.root_name(), &inv.id).await?)
    }

    async fn scan_root(&self) -> Result<()> {
        let declarations = self.source().declarations().await?;
        tracing::debug!(
            root = self.root_name(),
            objects = declarations.len(),
            "scanning storage root"
        );
        for decl in declarations {
            let object_path = decl.object_path;
            let prev = match self
                .index()
                .object_brief_by_path(self.root_name(), &object_path)
                .await
            {
                Ok(brief) => Some(brief),
                Err(err) if err.is_not_found() => None,
                Err(err) => {
                    tracing::error!(storage_path = %object_path, error = %err, "looking up indexed object");
                    continue;
                }
            };
            if let Err(err) = self.reindex_object_path(&object_path, prev).await {
                tracing::error!(storage_path = %object_path, error = %err, "indexing object");
            }
        }
        Ok(())
    }
}
