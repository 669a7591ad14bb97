//! Cross-version change sets
//!
//! Changes are computed from two version states loaded from the index, not
//! by rescanning inventories. Content addressing carries no rename signal,
//! so a rename appears as an add plus a delete.

use crate::error::{AccessError, Result};
use ocfl_access_core::PathMap;
use ocfl_access_index::IndexStore;
use serde::Serialize;

/// How a file changed between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One changed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Logical path in the version state
    pub path: String,
    /// The kind of change
    pub kind: ChangeKind,
}

/// The differences between two versions of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionChanges {
    /// Lower bound of the comparison; 0 means "before version 1"
    pub from_vnum: u32,
    /// Upper bound of the comparison
    pub to_vnum: u32,
    /// Changed files, sorted by path
    pub changes: Vec<FileChange>,
}

/// Load both states and compute the change set.
///
/// Direction is honored literally: reversing the bounds swaps Added and
/// Deleted. `from == to` yields no changes with the bounds echoed.
pub(crate) async fn version_changes(
    index: &IndexStore,
    root: &str,
    object_id: &str,
    from_vnum: u32,
    to_vnum: u32,
) -> Result<VersionChanges> {
    index
        .get_version(root, object_id, to_vnum)
        .await
        .map_err(AccessError::from)?;
    if from_vnum > 0 && from_vnum != to_vnum {
        index.get_version(root, object_id, from_vnum).await?;
    }
    if from_vnum == to_vnum {
        return Ok(VersionChanges {
            from_vnum,
            to_vnum,
            changes: Vec::new(),
        });
    }
    let from_state = if from_vnum == 0 {
        PathMap::new()
    } else {
        index.version_state(root, object_id, from_vnum).await?
    };
    let to_state = index.version_state(root, object_id, to_vnum).await?;
    Ok(VersionChanges {
        from_vnum,
        to_vnum,
        changes: compute_changes(&from_state, &to_state),
    })
}

/// Compare two states path by path
fn compute_changes(from_state: &PathMap, to_state: &PathMap) -> Vec<FileChange> {
    let mut changes = Vec::new();
    for (path, to_digest) in to_state.iter() {
        match from_state.get(path) {
            None => changes.push(FileChange {
                path: path.to_string(),
                kind: ChangeKind::Added,
            }),
            Some(from_digest) if from_digest != to_digest => changes.push(FileChange {
                path: path.to_string(),
                kind: ChangeKind::Modified,
            }),
            Some(_) => {}
        }
    }
    for (path, _) in from_state.iter() {
        if !to_state.contains_path(path) {
            changes.push(FileChange {
                path: path.to_string(),
                kind: ChangeKind::Deleted,
            });
        }
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, &str)]) -> PathMap {
        pairs
            .iter()
            .map(|(p, d)| (p.to_string(), d.to_string()))
            .collect()
    }

    #[test]
    fn test_added_modified_deleted() {
        let from_state = state(&[("a.txt", "d1"), ("b.txt", "d2"), ("gone.txt", "d3")]);
        let to_state = state(&[("a.txt", "d1"), ("b.txt", "d9"), ("c.txt", "d4")]);
        let changes = compute_changes(&from_state, &to_state);
        assert_eq!(
            changes,
            vec![
                FileChange { path: "b.txt".into(), kind: ChangeKind::Modified },
                FileChange { path: "c.txt".into(), kind: ChangeKind::Added },
                FileChange { path: "gone.txt".into(), kind: ChangeKind::Deleted },
            ]
        );
    }

    #[test]
    fn test_direction_reverses_add_and_delete() {
        let v1 = state(&[("old.txt", "d1"), ("same.txt", "d5")]);
        let v2 = state(&[("new.txt", "d2"), ("same.txt", "d5")]);
        let forward = compute_changes(&v1, &v2);
        let reverse = compute_changes(&v2, &v1);
        assert_eq!(
            forward,
            vec![
                FileChange { path: "new.txt".into(), kind: ChangeKind::Added },
                FileChange { path: "old.txt".into(), kind: ChangeKind::Deleted },
            ]
        );
        assert_eq!(
            reverse,
            vec![
                FileChange { path: "new.txt".into(), kind: ChangeKind::Deleted },
                FileChange { path: "old.txt".into(), kind: ChangeKind::Added },
            ]
        );
    }

    #[test]
    fn test_empty_from_means_everything_added() {
        let to_state = state(&[("a.txt", "d1"), ("b/c.txt", "d2")]);
        let changes = compute_changes(&PathMap::new(), &to_state);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
    }

    #[test]
    fn test_identical_states_no_changes() {
        let s = state(&[("a.txt", "d1")]);
        assert!(compute_changes(&s, &s).is_empty());
    }
}
