//! The SetObject write transaction
//!
//! Re-indexing replaces an object's rows from a freshly read inventory, in
//! one transaction: object row, manifest entries, versions 1..head, and the
//! version-file deltas of every version whose state digest changed. Nothing
//! becomes visible until commit.

use crate::error::{IndexError, Result};
use crate::model::SIZE_UNKNOWN;
use crate::state::version_state;
use crate::IndexStore;
use chrono::Utc;
use ocfl_access_core::{ObjectInventory, PathMap};
use sqlx::SqliteConnection;
use std::collections::HashMap;

const UPSERT_OBJECT_SQL: &str = "\
INSERT INTO ocfl_objects (root_id, object_id, storage_path, vpadding, alg, inventory_digest, indexed_at) \
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
ON CONFLICT (root_id, object_id) DO UPDATE SET \
    storage_path = excluded.storage_path, \
    vpadding = excluded.vpadding, \
    alg = excluded.alg, \
    inventory_digest = excluded.inventory_digest, \
    indexed_at = excluded.indexed_at";

// A sentinel-size insert keeps an already known size, but only while the
// path keeps its digest; new content means the old size no longer applies.
const UPSERT_CONTENT_FILE_SQL: &str = "\
INSERT INTO ocfl_content_files (object_id, path, digest, size) VALUES (?1, ?2, ?3, ?4) \
ON CONFLICT (object_id, path) DO UPDATE SET \
    size = CASE WHEN ocfl_content_files.digest = excluded.digest \
                THEN ocfl_content_files.size ELSE excluded.size END, \
    digest = excluded.digest";

const UPSERT_VERSION_SQL: &str = "\
INSERT INTO ocfl_versions (object_id, vnum, state_digest, created_at, user_name, user_addr, message) \
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
ON CONFLICT (object_id, vnum) DO UPDATE SET \
    state_digest = excluded.state_digest, \
    created_at = excluded.created_at, \
    user_name = excluded.user_name, \
    user_addr = excluded.user_addr, \
    message = excluded.message";

impl IndexStore {
    /// Add or replace the object in the index from its root inventory.
    ///
    /// Creates the root row on first use. Version-file rows are rewritten
    /// only for versions whose state digest changed, so an incremental
    /// update (a new head version) touches a single version's rows.
    pub async fn set_object(&self, root: &str, inv: &ObjectInventory) -> Result<()> {
        if inv.versions.is_empty() {
            return Err(IndexError::invalid_object(format!(
                "object {:?} has no versions",
                inv.id
            )));
        }
        let mut tx = self.pool().begin().await?;
        sqlx::query("INSERT INTO ocfl_roots (name) VALUES (?1) ON CONFLICT (name) DO NOTHING")
            .bind(root)
            .execute(&mut *tx)
            .await?;
        let root_id: i64 = sqlx::query_scalar("SELECT id FROM ocfl_roots WHERE name = ?1")
            .bind(root)
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query(UPSERT_OBJECT_SQL)
            .bind(root_id)
            .bind(&inv.id)
            .bind(&inv.storage_path)
            .bind(inv.version_padding as i64)
            .bind(&inv.digest_algorithm)
            .bind(&inv.inventory_digest)
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;
        let obj_row_id: i64 =
            sqlx::query_scalar("SELECT id FROM ocfl_objects WHERE root_id = ?1 AND object_id = ?2")
                .bind(root_id)
                .bind(&inv.id)
                .fetch_one(&mut *tx)
                .await?;
        set_content_files(&mut tx, obj_row_id, inv).await?;
        set_versions(&mut tx, obj_row_id, inv).await?;
        tx.commit().await?;
        tracing::debug!(object_id = %inv.id, head = inv.head(), "object indexed");
        Ok(())
    }
}

/// Upsert the manifest's content files and drop rows for paths the manifest
/// no longer mentions.
async fn set_content_files(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    inv: &ObjectInventory,
) -> Result<()> {
    let manifest = inv.manifest.path_map();
    for (path, digest) in manifest.iter() {
        sqlx::query(UPSERT_CONTENT_FILE_SQL)
            .bind(obj_row_id)
            .bind(path)
            .bind(digest)
            .bind(SIZE_UNKNOWN)
            .execute(&mut *conn)
            .await?;
    }
    let existing: Vec<String> =
        sqlx::query_scalar("SELECT path FROM ocfl_content_files WHERE object_id = ?1")
            .bind(obj_row_id)
            .fetch_all(&mut *conn)
            .await?;
    for path in existing {
        if !manifest.contains_path(&path) {
            sqlx::query("DELETE FROM ocfl_content_files WHERE object_id = ?1 AND path = ?2")
                .bind(obj_row_id)
                .bind(&path)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

/// Rewrite versions 1..head, dropping any higher-numbered leftovers from a
/// previous index of a longer history.
async fn set_versions(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    inv: &ObjectInventory,
) -> Result<()> {
    let existing: HashMap<i64, String> =
        sqlx::query_as::<_, (i64, String)>(
            "SELECT vnum, state_digest FROM ocfl_versions WHERE object_id = ?1",
        )
        .bind(obj_row_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();
    for (i, ver) in inv.versions.iter().enumerate() {
        let vnum = i as i64 + 1;
        let state = ver.state.path_map();
        let state_digest = state.state_digest();
        let (user_name, user_addr) = match &ver.user {
            Some(user) => (user.name.as_str(), user.address.as_str()),
            None => ("", ""),
        };
        sqlx::query(UPSERT_VERSION_SQL)
            .bind(obj_row_id)
            .bind(vnum)
            .bind(&state_digest)
            .bind(ver.created.timestamp())
            .bind(user_name)
            .bind(user_addr)
            .bind(&ver.message)
            .execute(&mut *conn)
            .await?;
        if existing.get(&vnum) != Some(&state_digest) {
            rewrite_version_files(conn, obj_row_id, vnum, &state).await?;
        }
    }
    sqlx::query("DELETE FROM ocfl_versions WHERE object_id = ?1 AND vnum > ?2")
        .bind(obj_row_id)
        .bind(inv.versions.len() as i64)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Replace a version's file rows with the delta against v−1: inserts for
/// added or changed paths, tombstones for paths gone since v−1. v1 inserts
/// every live path.
async fn rewrite_version_files(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    vnum: i64,
    state: &PathMap,
) -> Result<()> {
    let version_id: i64 =
        sqlx::query_scalar("SELECT id FROM ocfl_versions WHERE object_id = ?1 AND vnum = ?2")
            .bind(obj_row_id)
            .bind(vnum)
            .fetch_one(&mut *conn)
            .await?;
    sqlx::query("DELETE FROM ocfl_version_files WHERE version_id = ?1")
        .bind(version_id)
        .execute(&mut *conn)
        .await?;
    let prev = if vnum > 1 {
        version_state(conn, obj_row_id, vnum - 1).await?
    } else {
        PathMap::new()
    };
    for (path, digest) in state.iter() {
        if prev.get(path) == Some(digest) {
            continue;
        }
        insert_version_file(conn, obj_row_id, version_id, path, digest, false).await?;
    }
    for (path, digest) in prev.iter() {
        if !state.contains_path(path) {
            insert_version_file(conn, obj_row_id, version_id, path, digest, true).await?;
        }
    }
    Ok(())
}

async fn insert_version_file(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    version_id: i64,
    path: &str,
    digest: &str,
    is_deleted: bool,
) -> Result<()> {
    let content_id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM ocfl_content_files WHERE object_id = ?1 AND digest = ?2 ORDER BY id LIMIT 1",
    )
    .bind(obj_row_id)
    .bind(digest)
    .fetch_optional(&mut *conn)
    .await?;
    let content_id = content_id.ok_or_else(|| {
        IndexError::invalid_object(format!(
            "state path {path:?} references digest {digest:?} missing from the manifest"
        ))
    })?;
    sqlx::query(
        "INSERT INTO ocfl_version_files (version_id, content_id, path, is_deleted) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(version_id)
    .bind(content_id)
    .bind(path)
    .bind(is_deleted)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
