//! Digest/path map utilities
//!
//! OCFL inventories express both manifests and version states as maps of
//! content digest to one-or-more paths. Queries and diffs want the inverse
//! orientation (path to digest). `DigestMap` and `PathMap` convert between
//! the two, and `PathMap::state_digest` produces the canonical
//! order-independent fingerprint of a version state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;

/// A map of content digest to the paths that carry that content.
///
/// Paths within a digest keep insertion order; iteration over digests is
/// sorted. A digest may map to any number of paths, but a path must appear
/// under exactly one digest for the map to be well-formed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestMap(BTreeMap<String, Vec<String>>);

impl DigestMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path under the given digest
    pub fn insert(&mut self, digest: impl Into<String>, path: impl Into<String>) {
        self.0.entry(digest.into()).or_default().push(path.into());
    }

    /// Number of distinct digests
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the map holds no digests
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (path, digest) pairs in unspecified path order
    pub fn paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(digest, paths)| {
            paths.iter().map(move |p| (p.as_str(), digest.as_str()))
        })
    }

    /// Invert into a path-to-digest map
    pub fn path_map(&self) -> PathMap {
        PathMap(
            self.paths()
                .map(|(p, d)| (p.to_string(), d.to_string()))
                .collect(),
        )
    }

    /// Canonical fingerprint of the map's contents (see [`PathMap::state_digest`])
    pub fn state_digest(&self) -> String {
        self.path_map().state_digest()
    }
}

impl FromIterator<(String, String)> for DigestMap {
    /// Collect (digest, path) pairs
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = DigestMap::new();
        for (digest, path) in iter {
            map.insert(digest, path);
        }
        map
    }
}

/// A map of unique logical path to content digest, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathMap(BTreeMap<String, String>);

impl PathMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path with its digest
    pub fn insert(&mut self, path: impl Into<String>, digest: impl Into<String>) {
        self.0.insert(path.into(), digest.into());
    }

    /// Digest for the given path, if present
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// True if the path is present
    pub fn contains_path(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of paths
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the map holds no paths
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (path, digest) pairs in ascending path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, d)| (p.as_str(), d.as_str()))
    }

    /// Invert into a digest-to-paths map
    pub fn digest_map(&self) -> DigestMap {
        let mut map = DigestMap::new();
        for (path, digest) in self.iter() {
            map.insert(digest, path);
        }
        map
    }

    /// Canonical fingerprint of the map's contents.
    ///
    /// Defined as the hex SHA-512 of one `{path} {digest}\n` line per entry,
    /// concatenated in ascending path order. Two maps with the same contents
    /// always hash the same, regardless of construction order.
    pub fn state_digest(&self) -> String {
        let mut hasher = Sha512::new();
        for (path, digest) in self.iter() {
            hasher.update(path.as_bytes());
            hasher.update(b" ");
            hasher.update(digest.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(String, String)> for PathMap {
    /// Collect (path, digest) pairs
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        PathMap(iter.into_iter().collect())
    }
}
