//! Concurrent content-size backfill
//!
//! Manifests frequently omit sizes, but directory listings want totals.
//! After an inventory upsert, content files still lacking a size are
//! statted through the backing store with bounded parallelism and the
//! results written back in one digest-keyed transaction.

use crate::error::{AccessError, Result};
use crate::service::AccessService;
use futures::stream::{self, StreamExt, TryStreamExt};
use ocfl_access_core::{join_paths, InventorySource, ObjectInventory, StorageRead};
use std::collections::HashMap;

impl<R: InventorySource, F: StorageRead> AccessService<R, F> {
    /// Stat content files with unknown sizes and record the results.
    ///
    /// The missing set is keyed by digest: one stat covers every content
    /// path sharing that digest. No transaction is open while stats are in
    /// flight; the write begins only after every stat has completed.
    pub(crate) async fn backfill_sizes(&self, inv: &ObjectInventory) -> Result<()> {
        let files = self.index().content_files(self.root_name(), &inv.id).await?;
        let mut missing: HashMap<String, String> = HashMap::new();
        for file in files {
            if !file.has_size && !missing.contains_key(&file.digest) {
                missing.insert(file.digest, join_paths(&inv.storage_path, &file.path));
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            object_id = %inv.id,
            files = missing.len(),
            "statting content files for sizes"
        );
        let sizes = batch_stat(
            self.storage(),
            missing,
            self.config().effective_stat_concurrency(),
        )
        .await?;
        self.index()
            .set_content_sizes(self.root_name(), &inv.id, &sizes)
            .await?;
        Ok(())
    }
}

/// Stat each (digest, path) pair with at most `workers` calls in flight.
/// The first failure aborts the pass; in-flight stats are dropped with it.
async fn batch_stat<F: StorageRead>(
    storage: &F,
    files: HashMap<String, String>,
    workers: usize,
) -> Result<HashMap<String, i64>> {
    stream::iter(files)
        .map(|(digest, path)| async move {
            let meta = storage
                .stat_file(&path)
                .await
                .map_err(|e| AccessError::Storage(format!("stat {path:?}: {e}")))?;
            Ok::<_, AccessError>((digest, meta.size as i64))
        })
        .buffer_unordered(workers.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocfl_access_core::MemoryStorage;

    #[tokio::test]
    async fn test_batch_stat_collects_sizes() {
        let storage = MemoryStorage::new();
        storage.insert("obj/v1/content/a", vec![0u8; 11]);
        storage.insert("obj/v1/content/b", vec![0u8; 22]);

        let files: HashMap<String, String> = [
            ("d-a".to_string(), "obj/v1/content/a".to_string()),
            ("d-b".to_string(), "obj/v1/content/b".to_string()),
        ]
        .into_iter()
        .collect();

        let sizes = batch_stat(&storage, files, 4).await.unwrap();
        assert_eq!(sizes.get("d-a"), Some(&11));
        assert_eq!(sizes.get("d-b"), Some(&22));
    }

    #[tokio::test]
    async fn test_batch_stat_first_error_aborts() {
        let storage = MemoryStorage::new();
        storage.insert("obj/present", vec![0u8; 3]);

        let files: HashMap<String, String> = [
            ("d-1".to_string(), "obj/present".to_string()),
            ("d-2".to_string(), "obj/missing".to_string()),
        ]
        .into_iter()
        .collect();

        let err = batch_stat(&storage, files, 2).await.unwrap_err();
        assert!(matches!(err, AccessError::Storage(_)));
    }
}
