//! The staging area: a serialized mapping from working-tree path to blob
//! OID, sitting between the working tree and the object database.
//!
//! Unlike C git's binary index (entry stat cache, stages, extensions),
//! this index is "just" `path -> blob OID`, persisted as JSON. There is no
//! merge-stage tracking; conflicted paths are resolved before they reach
//! the index at all.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xsgit_hash::ObjectId;

/// Errors produced by index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("malformed index at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An in-memory, on-disk-backed staging area.
///
/// `BTreeMap` keeps paths in sorted order so the JSON serialization (and
/// anything iterating the index) is deterministic without an extra sort.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Index {
    entries: BTreeMap<String, ObjectId>,
}

impl Index {
    /// Load the index from `path`. A missing file is treated as an empty
    /// index, matching the "fresh repository has no staged changes" case.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| IndexError::Parse {
                path: path.to_path_buf(),
                source: e,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Index::default()),
            Err(e) => Err(IndexError::IoPath {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Write the index to `path` atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| IndexError::IoPath {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_vec_pretty(self).map_err(|e| IndexError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
        let mut file = fs::File::create(&tmp_path).map_err(|e| IndexError::IoPath {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(&json).map_err(|e| IndexError::IoPath {
            path: tmp_path.clone(),
            source: e,
        })?;
        drop(file);

        fs::rename(&tmp_path, path).map_err(|e| IndexError::IoPath {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn get(&self, path: &str) -> Option<ObjectId> {
        self.entries.get(path).copied()
    }

    pub fn set(&mut self, path: impl Into<String>, oid: ObjectId) {
        self.entries.insert(path.into(), oid);
    }

    pub fn remove(&mut self, path: &str) -> Option<ObjectId> {
        self.entries.remove(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.entries.iter().map(|(p, &oid)| (p.as_str(), oid))
    }

    /// Replace the whole contents, e.g. when `read-tree` repopulates the
    /// index wholesale from a tree.
    pub fn replace_all(&mut self, entries: BTreeMap<String, ObjectId>) {
        self.entries = entries;
    }

    pub fn as_map(&self) -> &BTreeMap<String, ObjectId> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(&format!("{:02x}", n).repeat(20)).unwrap()
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::load(&dir.path().join("index")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");

        let mut index = Index::default();
        index.set("a.txt", oid(1));
        index.set("dir/b.txt", oid(2));
        index.save(&path).unwrap();

        let loaded = Index::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("a.txt"), Some(oid(1)));
        assert_eq!(loaded.get("dir/b.txt"), Some(oid(2)));
    }

    #[test]
    fn remove_drops_entry() {
        let mut index = Index::default();
        index.set("a.txt", oid(1));
        assert_eq!(index.remove("a.txt"), Some(oid(1)));
        assert!(index.is_empty());
    }

    #[test]
    fn iter_is_sorted_by_path() {
        let mut index = Index::default();
        index.set("z.txt", oid(1));
        index.set("a.txt", oid(2));
        let paths: Vec<&str> = index.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a.txt", "z.txt"]);
    }
}
