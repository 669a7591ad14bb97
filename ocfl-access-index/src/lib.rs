//! # OCFL Access Index
//!
//! Relational persistence for the OCFL access engine: objects, manifest
//! entries, versions, and per-version file states (with deletion
//! tombstones) in SQLite, queried through `sqlx`.
//!
//! The store owns all rows and every multi-row write runs in a single
//! transaction. Version-file storage is incremental: a version only stores
//! the rows that changed relative to its predecessor, so "latest row ≤ v
//! per path" queries answer directory listings, stats, and modification
//! versions without rescanning earlier versions.

pub mod error;
pub mod model;

mod ingest;
mod objects;
mod sizes;
mod state;
mod versions;

pub use error::{IndexError, Result};
pub use model::{ContentFile, DirEntry, ObjectBrief, VersionBrief, VersionFile};

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// SQLite-backed index store
///
/// Cheap to clone; all clones share one connection pool. Reads check a
/// connection out per call; writes run inside a transaction that commits on
/// success and rolls back on error or drop.
#[derive(Debug, Clone)]
pub struct IndexStore {
    pool: SqlitePool,
}

impl IndexStore {
    /// Open (creating if necessary) the index database at `uri` and apply
    /// pending migrations.
    ///
    /// `uri` is a file path or the in-memory form (`sqlite::memory:`). An
    /// in-memory database lives and dies with its connection, so it is
    /// pinned to a single pooled connection that never expires.
    pub async fn open(uri: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool_opts = if uri.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(DEFAULT_MAX_CONNECTIONS)
        };
        let pool = pool_opts.connect_with(opts).await?;
        MIGRATOR.run(&pool).await?;
        tracing::debug!(uri, "opened index database");
        Ok(Self { pool })
    }

    /// Close the underlying connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All root names in the index, sorted. Roots are created implicitly by
    /// the first `set_object` under a name.
    pub async fn roots(&self) -> Result<Vec<String>> {
        Ok(
            sqlx::query_scalar("SELECT name FROM ocfl_roots ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Number of indexed objects under the given root
    pub async fn count_objects(&self, root: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT count(o.id) FROM ocfl_objects o \
             JOIN ocfl_roots r ON r.id = o.root_id WHERE r.name = ?1",
        )
        .bind(root)
        .fetch_one(&self.pool)
        .await?)
    }
}
