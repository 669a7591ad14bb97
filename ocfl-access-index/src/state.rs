//! Version-state queries: directory listings, file stat, state loading
//!
//! Everything here is driven by one query shape: for each logical path
//! under a directory, the version-file row with the greatest version number
//! not above the requested version, deletion tombstones included. Because
//! version files store deltas, that row tells both what the path holds and
//! when it last changed.

use crate::error::{IndexError, Result};
use crate::model::{present_time, DirEntry, VersionFile};
use crate::objects::object_row_id;
use crate::versions::version_brief;
use crate::IndexStore;
use ocfl_access_core::PathMap;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

const VERSION_FILE_COLUMNS: &str = "\
vf.path AS path, cf.path AS content_path, cf.digest AS digest, cf.size AS size, \
vf.is_deleted AS is_deleted, v.vnum AS mod_vnum, v.created_at AS mod_time";

// Latest row ≤ ?2 per path; a live row sorts before a tombstone at the
// same path so directory aggregation sees the surviving shape first.
const LATEST_ROW_FILTER: &str = "\
v.object_id = ?1 AND v.vnum <= ?2 \
AND v.vnum = (SELECT MAX(v2.vnum) FROM ocfl_version_files vf2 \
              JOIN ocfl_versions v2 ON v2.id = vf2.version_id \
              WHERE v2.object_id = ?1 AND vf2.path = vf.path AND v2.vnum <= ?2)";

#[derive(sqlx::FromRow)]
pub(crate) struct VersionFileRow {
    pub(crate) path: String,
    pub(crate) content_path: String,
    pub(crate) digest: String,
    pub(crate) size: i64,
    pub(crate) is_deleted: bool,
    pub(crate) mod_vnum: i64,
    pub(crate) mod_time: i64,
}

/// List the latest version-file row at or below `vnum` for every logical
/// path under `dir` (`"."` lists the whole state). Rows are ordered by
/// (path asc, is_deleted asc).
pub(crate) async fn list_version_files(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    vnum: i64,
    dir: &str,
) -> Result<Vec<VersionFileRow>> {
    let rows = if dir == "." || dir.is_empty() {
        let sql = format!(
            "SELECT {VERSION_FILE_COLUMNS} FROM ocfl_version_files vf \
             JOIN ocfl_versions v ON v.id = vf.version_id \
             JOIN ocfl_content_files cf ON cf.id = vf.content_id \
             WHERE {LATEST_ROW_FILTER} \
             ORDER BY vf.path ASC, vf.is_deleted ASC"
        );
        sqlx::query_as(&sql)
            .bind(obj_row_id)
            .bind(vnum)
            .fetch_all(&mut *conn)
            .await?
    } else {
        // range-scan the dir prefix: '0' is the code point after '/'
        let sql = format!(
            "SELECT {VERSION_FILE_COLUMNS} FROM ocfl_version_files vf \
             JOIN ocfl_versions v ON v.id = vf.version_id \
             JOIN ocfl_content_files cf ON cf.id = vf.content_id \
             WHERE vf.path > ?3 AND vf.path < ?4 AND {LATEST_ROW_FILTER} \
             ORDER BY vf.path ASC, vf.is_deleted ASC"
        );
        sqlx::query_as(&sql)
            .bind(obj_row_id)
            .bind(vnum)
            .bind(format!("{dir}/"))
            .bind(format!("{dir}0"))
            .fetch_all(&mut *conn)
            .await?
    };
    Ok(rows)
}

/// Load the live path→digest state of a version
pub(crate) async fn version_state(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    vnum: i64,
) -> Result<PathMap> {
    let rows = list_version_files(conn, obj_row_id, vnum, ".").await?;
    Ok(rows
        .into_iter()
        .filter(|r| !r.is_deleted)
        .map(|r| (r.path, r.digest))
        .collect())
}

struct DirAccum {
    mod_vnum: i64,
    mod_time: i64,
    live: Option<LiveShape>,
}

struct LiveShape {
    is_dir: bool,
    digest: String,
    size: i64,
    has_size: bool,
}

/// Aggregate version-file rows under `dir` into one entry per child name.
///
/// Tombstones contribute only to the modifying version: a directory counts
/// as modified when a descendant was deleted, even if every surviving file
/// is older. A name with no live rows produces no entry.
fn collect_dir_entries(rows: Vec<VersionFileRow>, dir: &str) -> Vec<DirEntry> {
    let prefix_len = if dir == "." || dir.is_empty() {
        0
    } else {
        dir.len() + 1
    };
    let mut groups: BTreeMap<String, DirAccum> = BTreeMap::new();
    for row in rows {
        let rel = &row.path[prefix_len..];
        let (name, is_sub) = match rel.split_once('/') {
            Some((name, _)) => (name, true),
            None => (rel, false),
        };
        let acc = groups.entry(name.to_string()).or_insert(DirAccum {
            mod_vnum: 0,
            mod_time: 0,
            live: None,
        });
        if row.mod_vnum > acc.mod_vnum {
            acc.mod_vnum = row.mod_vnum;
            acc.mod_time = row.mod_time;
        }
        if row.is_deleted {
            continue;
        }
        let (size, has_size) = if row.size < 0 { (0, false) } else { (row.size, true) };
        match &mut acc.live {
            None => {
                acc.live = Some(LiveShape {
                    is_dir: is_sub,
                    digest: if is_sub { String::new() } else { row.digest },
                    size,
                    has_size,
                });
            }
            Some(shape) => {
                shape.size += size;
                shape.has_size = shape.has_size && has_size;
            }
        }
    }
    groups
        .into_iter()
        .filter_map(|(name, acc)| {
            acc.live.map(|shape| DirEntry {
                name,
                digest: shape.digest,
                mod_vnum: acc.mod_vnum as u32,
                mod_time: present_time(acc.mod_time),
                size: shape.size,
                has_size: shape.has_size,
                is_dir: shape.is_dir,
            })
        })
        .collect()
}

impl IndexStore {
    /// Directory listing for `dir` in the version's logical state.
    ///
    /// Only the root directory (`"."`) may be empty; an empty listing
    /// anywhere else means the directory doesn't exist in that state and is
    /// NotFound. A path that resolves to a live file is also NotFound.
    pub async fn read_version_dir(
        &self,
        root: &str,
        object_id: &str,
        vnum: u32,
        dir: &str,
    ) -> Result<Vec<DirEntry>> {
        let dir = if dir.is_empty() { "." } else { dir };
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        version_brief(&mut conn, obj, vnum as i64).await?;
        let rows = list_version_files(&mut conn, obj, vnum as i64, dir).await?;
        let entries = collect_dir_entries(rows, dir);
        if entries.is_empty() && dir != "." {
            return Err(IndexError::not_found(format!(
                "object id={object_id:?} v{vnum} directory {dir:?}"
            )));
        }
        Ok(entries)
    }

    /// File information for a live file in the version's logical state.
    ///
    /// A path that was deleted at or before `vnum` is NotFound, even if an
    /// earlier version had it live.
    pub async fn stat_version_file(
        &self,
        root: &str,
        object_id: &str,
        vnum: u32,
        path: &str,
    ) -> Result<VersionFile> {
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        version_brief(&mut conn, obj, vnum as i64).await?;
        let sql = format!(
            "SELECT {VERSION_FILE_COLUMNS} FROM ocfl_version_files vf \
             JOIN ocfl_versions v ON v.id = vf.version_id \
             JOIN ocfl_content_files cf ON cf.id = vf.content_id \
             WHERE v.object_id = ?1 AND vf.path = ?2 AND v.vnum <= ?3 \
             ORDER BY v.vnum DESC, vf.is_deleted ASC LIMIT 1"
        );
        let row: Option<VersionFileRow> = sqlx::query_as(&sql)
            .bind(obj)
            .bind(path)
            .bind(vnum as i64)
            .fetch_optional(&mut *conn)
            .await?;
        let row = row.filter(|r| !r.is_deleted).ok_or_else(|| {
            IndexError::not_found(format!("object id={object_id:?} v{vnum} file {path:?}"))
        })?;
        let (size, has_size) = crate::model::present_size(row.size);
        Ok(VersionFile {
            path: row.path,
            content_path: row.content_path,
            digest: row.digest,
            mod_vnum: row.mod_vnum as u32,
            mod_time: present_time(row.mod_time),
            size,
            has_size,
        })
    }

    /// The live path→digest state of a version
    pub async fn version_state(&self, root: &str, object_id: &str, vnum: u32) -> Result<PathMap> {
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        version_brief(&mut conn, obj, vnum as i64).await?;
        version_state(&mut conn, obj, vnum as i64).await
    }
}
