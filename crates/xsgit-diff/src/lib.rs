//! Tree comparison and the `TextDiff` text-diff operator.
//!
//! Operates over flat `path -> blob OID` maps (the shape both the index
//! and an expanded tree present), not over nested `Tree` objects — tree
//! expansion is the caller's job.

pub mod algorithm;
pub mod format;

use std::collections::BTreeMap;

use xsgit_hash::ObjectId;
use xsgit_odb::{ObjectStore, OdbError};

pub use algorithm::{diff_lines, diff_lines_default, DiffLine, Hunk};

/// Errors produced by diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error(transparent)]
    Odb(#[from] OdbError),
}

/// How a path's content differs between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Deleted,
    Modified,
}

/// A single changed path between two `path -> oid` maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: ChangeStatus,
    pub old_oid: Option<ObjectId>,
    pub new_oid: Option<ObjectId>,
}

/// Compare any number of `path -> oid` maps, producing one row per path
/// that appears in at least one of them, with `None` where absent.
pub fn compare_trees(trees: &[&BTreeMap<String, ObjectId>]) -> Vec<(String, Vec<Option<ObjectId>>)> {
    let mut paths: Vec<&str> = Vec::new();
    for tree in trees {
        for path in tree.keys() {
            if !paths.contains(&path.as_str()) {
                paths.push(path.as_str());
            }
        }
    }
    paths.sort_unstable();

    paths
        .into_iter()
        .map(|path| {
            let oids = trees.iter().map(|tree| tree.get(path).copied()).collect();
            (path.to_string(), oids)
        })
        .collect()
}

/// Classify every path whose OID differs between `old` and `new`.
pub fn iter_changed_files(
    old: &BTreeMap<String, ObjectId>,
    new: &BTreeMap<String, ObjectId>,
) -> Vec<ChangedFile> {
    compare_trees(&[old, new])
        .into_iter()
        .filter_map(|(path, oids)| {
            let old_oid = oids[0];
            let new_oid = oids[1];
            if old_oid == new_oid {
                return None;
            }
            let status = match (old_oid, new_oid) {
                (None, Some(_)) => ChangeStatus::Added,
                (Some(_), None) => ChangeStatus::Deleted,
                _ => ChangeStatus::Modified,
            };
            Some(ChangedFile {
                path,
                status,
                old_oid,
                new_oid,
            })
        })
        .collect()
}

/// The `TextDiff` operator: a unified diff between two (possibly absent)
/// blobs at `path`, labelled `a/<path>` and `b/<path>`.
///
/// A missing side (the file didn't exist on that side) is treated as
/// empty content.
pub fn text_diff(
    odb: &ObjectStore,
    path: &str,
    old_oid: Option<ObjectId>,
    new_oid: Option<ObjectId>,
) -> Result<Vec<u8>, DiffError> {
    let old_bytes = match old_oid {
        Some(oid) => odb.get_blob(&oid)?,
        None => Vec::new(),
    };
    let new_bytes = match new_oid {
        Some(oid) => odb.get_blob(&oid)?,
        None => Vec::new(),
    };

    let hunks = diff_lines_default(&old_bytes, &new_bytes);
    Ok(format::format_unified(
        &format!("a/{path}"),
        &format!("b/{path}"),
        &hunks,
    ))
}
