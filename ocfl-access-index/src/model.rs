//! Public result types for index queries
//!
//! Sizes are presented as `(size, has_size)`: the storage layer keeps a
//! `-1` sentinel for "unknown", which is never exposed to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The storage-layer sentinel for "size unknown"
pub(crate) const SIZE_UNKNOWN: i64 = -1;

/// Convert a stored size into its presented `(size, has_size)` form
pub(crate) fn present_size(stored: i64) -> (i64, bool) {
    if stored < 0 {
        (0, false)
    } else {
        (stored, true)
    }
}

/// Convert unix epoch seconds into a timestamp
pub(crate) fn present_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// High-level summary of an indexed object, without manifest or states
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectBrief {
    /// The object's unique identifier
    pub id: String,
    /// Path of the object root, relative to the backing store
    pub storage_path: String,
    /// Current (head) version number
    pub head: u32,
    /// Zero-padding width of the object's version numbering scheme
    pub version_padding: u32,
    /// Digest algorithm of the root inventory
    pub digest_algorithm: String,
    /// Root inventory digest, the sync fingerprint
    pub inventory_digest: String,
    /// Created time of the first version
    pub created_at: DateTime<Utc>,
    /// Created time of the most recent version
    pub updated_at: DateTime<Utc>,
    /// When this record was last verified against the storage root
    pub indexed_at: DateTime<Utc>,
}

/// Summary of one object version, without its state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionBrief {
    /// Version number (1-based)
    pub vnum: u32,
    /// Zero-padding width of the object's version numbering scheme
    pub version_padding: u32,
    /// Canonical fingerprint of the version's logical state
    pub state_digest: String,
    /// Version message (may be empty)
    pub message: String,
    /// Version user name (may be empty)
    pub user_name: String,
    /// Version user address (may be empty)
    pub user_addr: String,
    /// When the version was created
    pub created: DateTime<Utc>,
}

/// A manifest entry: one content path with its digest and (optional) size
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentFile {
    /// Content path relative to the object root
    pub path: String,
    /// Content digest
    pub digest: String,
    /// Size in bytes; only valid when `has_size` is true
    pub size: i64,
    /// True when the size is known
    pub has_size: bool,
}

/// A live file in a version's logical state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionFile {
    /// Logical path in the version state
    pub path: String,
    /// Content path relative to the object root
    pub content_path: String,
    /// Content digest
    pub digest: String,
    /// Version in which the file was created or last changed
    pub mod_vnum: u32,
    /// Created time of that version
    pub mod_time: DateTime<Utc>,
    /// Size in bytes; only valid when `has_size` is true
    pub size: i64,
    /// True when the size is known
    pub has_size: bool,
}

/// One entry in a version-state directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Base name of the file or directory
    pub name: String,
    /// Content digest; empty for directories
    pub digest: String,
    /// Version in which the entry was last modified. For files, when the
    /// file was created or its digest changed. For directories, when any
    /// descendant was created, updated, or deleted.
    pub mod_vnum: u32,
    /// Created time of that version
    pub mod_time: DateTime<Utc>,
    /// File size, or the sum of descendant file sizes for directories;
    /// only valid when `has_size` is true
    pub size: i64,
    /// True when the size (of every contributing file) is known
    pub has_size: bool,
    /// True if the entry is a directory
    pub is_dir: bool,
}
