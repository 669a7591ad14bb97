//! Version metadata queries

use crate::error::{IndexError, Result};
use crate::model::{present_time, VersionBrief};
use crate::objects::object_row_id;
use crate::IndexStore;
use sqlx::SqliteConnection;

const VERSION_COLUMNS: &str = "\
v.vnum AS vnum, o.vpadding AS vpadding, v.state_digest AS state_digest, \
v.message AS message, v.user_name AS user_name, v.user_addr AS user_addr, \
v.created_at AS created_at";

#[derive(sqlx::FromRow)]
struct VersionRow {
    vnum: i64,
    vpadding: i64,
    state_digest: String,
    message: String,
    user_name: String,
    user_addr: String,
    created_at: i64,
}

impl From<VersionRow> for VersionBrief {
    fn from(row: VersionRow) -> Self {
        VersionBrief {
            vnum: row.vnum as u32,
            version_padding: row.vpadding as u32,
            state_digest: row.state_digest,
            message: row.message,
            user_name: row.user_name,
            user_addr: row.user_addr,
            created: present_time(row.created_at),
        }
    }
}

/// Fetch one version by object row id and version number
pub(crate) async fn version_brief(
    conn: &mut SqliteConnection,
    obj_row_id: i64,
    vnum: i64,
) -> Result<VersionBrief> {
    let sql = format!(
        "SELECT {VERSION_COLUMNS} FROM ocfl_versions v \
         JOIN ocfl_objects o ON o.id = v.object_id \
         WHERE v.object_id = ?1 AND v.vnum = ?2"
    );
    let row: Option<VersionRow> = sqlx::query_as(&sql)
        .bind(obj_row_id)
        .bind(vnum)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(VersionBrief::from)
        .ok_or_else(|| IndexError::not_found(format!("version v{vnum}")))
}

impl IndexStore {
    /// Metadata for one version of the object
    pub async fn get_version(&self, root: &str, object_id: &str, vnum: u32) -> Result<VersionBrief> {
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        version_brief(&mut conn, obj, vnum as i64)
            .await
            .map_err(|e| match e {
                IndexError::NotFound(_) => {
                    IndexError::not_found(format!("object id={object_id:?} version v{vnum}"))
                }
                other => other,
            })
    }

    /// All versions of the object, v1 through head
    pub async fn list_versions(&self, root: &str, object_id: &str) -> Result<Vec<VersionBrief>> {
        let mut conn = self.pool().acquire().await?;
        let obj = object_row_id(&mut conn, root, object_id).await?;
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM ocfl_versions v \
             JOIN ocfl_objects o ON o.id = v.object_id \
             WHERE v.object_id = ?1 ORDER BY v.vnum"
        );
        let rows: Vec<VersionRow> = sqlx::query_as(&sql)
            .bind(obj)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(VersionBrief::from).collect())
    }
}
