//! Content-file listing and digest-keyed size updates

use crate::error::Result;
use crate::model::{present_size, ContentFile};
use crate::objects::object_row_id;
use crate::IndexStore;
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct ContentFileRow {
    path: String,
    digest: String,
    size: i64,
}

impl IndexStore {
    /// All manifest entries for the object, ordered by content path
    pub async fn content_files(&self, root: &str, object_id: &str) -> Result<Vec<ContentFile>> {
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        let rows: Vec<ContentFileRow> = sqlx::query_as(
            "SELECT path, digest, size FROM ocfl_content_files \
             WHERE object_id = ?1 ORDER BY path",
        )
        .bind(obj)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let (size, has_size) = present_size(row.size);
                ContentFile {
                    path: row.path,
                    digest: row.digest,
                    size,
                    has_size,
                }
            })
            .collect())
    }

    /// Record sizes for content files, keyed by digest so every content
    /// path sharing a digest is covered by one update. Runs in a single
    /// transaction. Negative input sizes are ignored, so a known size is
    /// never regressed to unknown.
    pub async fn set_content_sizes(
        &self,
        root: &str,
        object_id: &str,
        sizes: &HashMap<String, i64>,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        let obj = object_row_id(&mut *tx, root, object_id).await?;
        let mut updated = 0u64;
        for (digest, size) in sizes {
            if *size < 0 {
                continue;
            }
            let result = sqlx::query(
                "UPDATE ocfl_content_files SET size = ?3 \
                 WHERE object_id = ?1 AND digest = ?2",
            )
            .bind(obj)
            .bind(digest)
            .bind(size)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }
        tx.commit().await?;
        tracing::debug!(object_id, rows = updated, "content file sizes recorded");
        Ok(())
    }
}
