//! Object-level lookups and lifecycle

use crate::error::{IndexError, Result};
use crate::model::{present_time, ObjectBrief};
use crate::IndexStore;
use chrono::Utc;
use sqlx::SqliteConnection;

const OBJECT_BRIEF_COLUMNS: &str = "\
o.object_id AS object_id, o.storage_path AS storage_path, o.vpadding AS vpadding, \
o.alg AS alg, o.inventory_digest AS inventory_digest, o.indexed_at AS indexed_at, \
MAX(v.vnum) AS head, MIN(v.created_at) AS created_at, MAX(v.created_at) AS updated_at";

#[derive(sqlx::FromRow)]
struct ObjectBriefRow {
    object_id: String,
    storage_path: String,
    vpadding: i64,
    alg: String,
    inventory_digest: String,
    indexed_at: i64,
    head: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<ObjectBriefRow> for ObjectBrief {
    fn from(row: ObjectBriefRow) -> Self {
        ObjectBrief {
            id: row.object_id,
            storage_path: row.storage_path,
            head: row.head as u32,
            version_padding: row.vpadding as u32,
            digest_algorithm: row.alg,
            inventory_digest: row.inventory_digest,
            created_at: present_time(row.created_at),
            updated_at: present_time(row.updated_at),
            indexed_at: present_time(row.indexed_at),
        }
    }
}

/// Resolve the database row id for (root, object id)
pub(crate) async fn object_row_id(
    conn: &mut SqliteConnection,
    root: &str,
    object_id: &str,
) -> Result<i64> {
    sqlx::query_scalar(
        "SELECT o.id FROM ocfl_objects o \
         JOIN ocfl_roots r ON r.id = o.root_id \
         WHERE r.name = ?1 AND o.object_id = ?2",
    )
    .bind(root)
    .bind(object_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| IndexError::not_found(format!("object root={root:?} id={object_id:?}")))
}

impl IndexStore {
    /// Summary of the object with the given ID
    pub async fn object_brief(&self, root: &str, object_id: &str) -> Result<ObjectBrief> {
        let sql = format!(
            "SELECT {OBJECT_BRIEF_COLUMNS} FROM ocfl_objects o \
             JOIN ocfl_roots r ON r.id = o.root_id \
             JOIN ocfl_versions v ON v.object_id = o.id \
             WHERE r.name = ?1 AND o.object_id = ?2 GROUP BY o.id"
        );
        let row: Option<ObjectBriefRow> = sqlx::query_as(&sql)
            .bind(root)
            .bind(object_id)
            .fetch_optional(self.pool())
            .await?;
        row.map(ObjectBrief::from)
            .ok_or_else(|| IndexError::not_found(format!("object root={root:?} id={object_id:?}")))
    }

    /// Summary of the object rooted at the given storage path.
    ///
    /// The storage path is relative to the backing store, not to the OCFL
    /// storage root; root scans discover paths before they know IDs.
    pub async fn object_brief_by_path(&self, root: &str, storage_path: &str) -> Result<ObjectBrief> {
        let sql = format!(
            "SELECT {OBJECT_BRIEF_COLUMNS} FROM ocfl_objects o \
             JOIN ocfl_roots r ON r.id = o.root_id \
             JOIN ocfl_versions v ON v.object_id = o.id \
             WHERE r.name = ?1 AND o.storage_path = ?2 GROUP BY o.id"
        );
        let row: Option<ObjectBriefRow> = sqlx::query_as(&sql)
            .bind(root)
            .bind(storage_path)
            .fetch_optional(self.pool())
            .await?;
        row.map(ObjectBrief::from).ok_or_else(|| {
            IndexError::not_found(format!("object root={root:?} storage_path={storage_path:?}"))
        })
    }

    /// One page of object summaries, ordered by object ID
    pub async fn list_objects(
        &self,
        root: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ObjectBrief>> {
        let sql = format!(
            "SELECT {OBJECT_BRIEF_COLUMNS} FROM ocfl_objects o \
             JOIN ocfl_roots r ON r.id = o.root_id \
             JOIN ocfl_versions v ON v.object_id = o.id \
             WHERE r.name = ?1 GROUP BY o.id \
             ORDER BY o.object_id LIMIT ?2 OFFSET ?3"
        );
        let rows: Vec<ObjectBriefRow> = sqlx::query_as(&sql)
            .bind(root)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(ObjectBrief::from).collect())
    }

    /// Bump the object's `indexed_at` stamp to now and return the new summary
    pub async fn touch_object(&self, root: &str, object_id: &str) -> Result<ObjectBrief> {
        sqlx::query(
            "UPDATE ocfl_objects SET indexed_at = ?3 \
             WHERE object_id = ?2 \
               AND root_id = (SELECT id FROM ocfl_roots WHERE name = ?1)",
        )
        .bind(root)
        .bind(object_id)
        .bind(Utc::now().timestamp())
        .execute(self.pool())
        .await?;
        self.object_brief(root, object_id).await
    }

    /// Remove the object and all dependent rows. Succeeds when the object
    /// doesn't exist.
    pub async fn unset_object(&self, root: &str, object_id: &str) -> Result<()> {
        sqlx::query(
            "DELETE FROM ocfl_objects \
             WHERE object_id = ?2 \
               AND root_id = (SELECT id FROM ocfl_roots WHERE name = ?1)",
        )
        .bind(root)
        .bind(object_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
