//! The reference namespace: named pointers into the object store, with
//! symbolic (pointer-to-pointer) indirection.
//!
//! A reference file's content is either a 40-hex OID (`Direct`) or the
//! literal string `ref: <path>` (`Symbolic`, naming another reference).
//! `HEAD` is symbolic at most of the time (pointing at a branch); after a
//! detached checkout it is direct.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use xsgit_hash::{HashError, ObjectId};

/// Bound on symbolic-chain length; a longer chain is treated as a cycle.
const MAX_SYMBOLIC_DEPTH: usize = 8;

/// Errors produced by reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("symbolic reference chain from '{0}' is too long (possible cycle)")]
    SymbolicLoop(String),

    #[error("cannot write an empty value to ref '{0}'")]
    EmptyValue(String),

    #[error("malformed ref content in '{name}': {reason}")]
    Parse { name: String, reason: String },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A reference's content: either a direct OID or a symbolic indirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Direct(ObjectId),
    Symbolic(String),
}

impl RefValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, RefValue::Symbolic(_))
    }

    pub fn as_oid(&self) -> Option<ObjectId> {
        match self {
            RefValue::Direct(oid) => Some(*oid),
            RefValue::Symbolic(_) => None,
        }
    }

    fn serialize(&self) -> String {
        match self {
            RefValue::Direct(oid) => format!("{}\n", oid.to_hex()),
            RefValue::Symbolic(target) => format!("ref: {target}\n"),
        }
    }

    fn parse(name: &str, content: &str) -> Result<Self, RefError> {
        let trimmed = content.trim();
        if let Some(target) = trimmed.strip_prefix("ref: ") {
            Ok(RefValue::Symbolic(target.trim().to_string()))
        } else {
            Ok(RefValue::Direct(ObjectId::from_hex(trimmed).map_err(
                |e| RefError::Parse {
                    name: name.to_string(),
                    reason: e.to_string(),
                },
            )?))
        }
    }
}

/// The reference namespace, rooted at the repository control directory.
pub struct RefStore {
    repo_dir: PathBuf,
}

impl RefStore {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.repo_dir.join(name)
    }

    fn read_raw(&self, name: &str) -> Result<Option<RefValue>, RefError> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(RefValue::parse(name, &content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RefError::IoPath { path, source: e }),
        }
    }

    fn write_raw(&self, name: &str, value: &RefValue) -> Result<(), RefError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RefError::IoPath {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let tmp_path = path.with_extension(format!("lock.{}", std::process::id()));
        let mut file = fs::File::create(&tmp_path).map_err(|e| RefError::IoPath {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(value.serialize().as_bytes())
            .map_err(|e| RefError::IoPath {
                path: tmp_path.clone(),
                source: e,
            })?;
        drop(file);
        fs::rename(&tmp_path, &path).map_err(|e| RefError::IoPath { path, source: e })
    }

    /// Follow the symbolic chain starting at `name` and return the name of
    /// the tail — the first non-symbolic (or missing) ref in the chain.
    /// This is where `update`/`delete` with `deref=true` actually act.
    fn tail_name(&self, name: &str) -> Result<String, RefError> {
        let mut current = name.to_string();
        for _ in 0..MAX_SYMBOLIC_DEPTH {
            match self.read_raw(&current)? {
                Some(RefValue::Symbolic(target)) => current = target,
                _ => return Ok(current),
            }
        }
        Err(RefError::SymbolicLoop(name.to_string()))
    }

    /// Resolve `name`, returning the tail's value (or its immediate value
    /// when `deref` is false). A non-existent ref returns `Ok(None)`.
    pub fn get(&self, name: &str, deref: bool) -> Result<Option<RefValue>, RefError> {
        if !deref {
            return self.read_raw(name);
        }
        let tail = self.tail_name(name)?;
        self.read_raw(&tail)
    }

    /// Convenience: fully dereference `name` down to a concrete OID.
    pub fn resolve_oid(&self, name: &str) -> Result<Option<ObjectId>, RefError> {
        Ok(self.get(name, true)?.and_then(|v| v.as_oid()))
    }

    /// Write `value` at `name` (or at the tail of `name`'s symbolic chain,
    /// when `deref` is true). Parent directories are created on demand.
    pub fn update(&self, name: &str, value: RefValue, deref: bool) -> Result<(), RefError> {
        let target = if deref {
            self.tail_name(name)?
        } else {
            name.to_string()
        };
        self.write_raw(&target, &value)
    }

    /// Remove the tail of `name`'s chain (or `name` itself when `deref` is
    /// false). Removing a ref that does not exist is not an error.
    pub fn delete(&self, name: &str, deref: bool) -> Result<(), RefError> {
        let target = if deref {
            self.tail_name(name)?
        } else {
            name.to_string()
        };
        let path = self.path_for(&target);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RefError::IoPath { path, source: e }),
        }
    }

    /// Enumerate every reference whose name starts with `prefix`. The
    /// candidate set is `{HEAD, MERGE_HEAD} ∪ refs/**`; only entries whose
    /// resolved value is non-null are yielded.
    pub fn iter(&self, prefix: &str, deref: bool) -> Result<Vec<(String, RefValue)>, RefError> {
        let mut names = Vec::new();
        for special in ["HEAD", "MERGE_HEAD"] {
            if special.starts_with(prefix) {
                names.push(special.to_string());
            }
        }
        self.collect_refs_dir(&self.repo_dir.join("refs"), "refs", prefix, &mut names)?;
        names.sort();

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            if let Some(value) = self.get(&name, deref)? {
                out.push((name, value));
            }
        }
        Ok(out)
    }

    fn collect_refs_dir(
        &self,
        dir: &Path,
        rel: &str,
        prefix: &str,
        out: &mut Vec<String>,
    ) -> Result<(), RefError> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(RefError::IoPath {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
        };
        for entry in entries {
            let entry = entry.map_err(|e| RefError::IoPath {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let rel_name = format!("{rel}/{name}");
            if path.is_dir() {
                self.collect_refs_dir(&path, &rel_name, prefix, out)?;
            } else if rel_name.starts_with(prefix) {
                out.push(rel_name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, RefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RefStore::new(dir.path());
        (dir, store)
    }

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(&format!("{:02x}", n).repeat(20)).unwrap()
    }

    #[test]
    fn direct_ref_roundtrip() {
        let (_d, refs) = repo();
        refs.update("refs/heads/main", RefValue::Direct(oid(1)), true)
            .unwrap();
        let value = refs.get("refs/heads/main", true).unwrap().unwrap();
        assert_eq!(value, RefValue::Direct(oid(1)));
    }

    #[test]
    fn symbolic_head_dereferences_to_branch_tip() {
        let (_d, refs) = repo();
        refs.update(
            "HEAD",
            RefValue::Symbolic("refs/heads/main".into()),
            false,
        )
        .unwrap();
        refs.update("refs/heads/main", RefValue::Direct(oid(2)), true)
            .unwrap();

        let deref = refs.get("HEAD", true).unwrap().unwrap();
        assert_eq!(deref, RefValue::Direct(oid(2)));

        let raw = refs.get("HEAD", false).unwrap().unwrap();
        assert_eq!(raw, RefValue::Symbolic("refs/heads/main".into()));
    }

    #[test]
    fn update_deref_moves_the_branch_not_head() {
        let (_d, refs) = repo();
        refs.update(
            "HEAD",
            RefValue::Symbolic("refs/heads/main".into()),
            false,
        )
        .unwrap();
        // commit-style update: deref=true follows HEAD to refs/heads/main.
        refs.update("HEAD", RefValue::Direct(oid(3)), true).unwrap();

        assert_eq!(
            refs.get("HEAD", false).unwrap().unwrap(),
            RefValue::Symbolic("refs/heads/main".into())
        );
        assert_eq!(
            refs.get("refs/heads/main", false).unwrap().unwrap(),
            RefValue::Direct(oid(3))
        );
    }

    #[test]
    fn missing_ref_is_none() {
        let (_d, refs) = repo();
        assert!(refs.get("refs/heads/nope", true).unwrap().is_none());
    }

    #[test]
    fn delete_removes_tail() {
        let (_d, refs) = repo();
        refs.update("refs/tags/v1", RefValue::Direct(oid(4)), true)
            .unwrap();
        refs.delete("refs/tags/v1", true).unwrap();
        assert!(refs.get("refs/tags/v1", true).unwrap().is_none());
    }

    #[test]
    fn delete_missing_is_not_an_error() {
        let (_d, refs) = repo();
        refs.delete("refs/heads/nope", true).unwrap();
    }

    #[test]
    fn iter_yields_prefix_matches_only() {
        let (_d, refs) = repo();
        refs.update("refs/heads/main", RefValue::Direct(oid(1)), true)
            .unwrap();
        refs.update("refs/heads/feature", RefValue::Direct(oid(2)), true)
            .unwrap();
        refs.update("refs/tags/v1", RefValue::Direct(oid(3)), true)
            .unwrap();

        let heads = refs.iter("refs/heads/", true).unwrap();
        assert_eq!(heads.len(), 2);
        assert!(heads.iter().all(|(name, _)| name.starts_with("refs/heads/")));
    }

    #[test]
    fn iter_includes_head_and_merge_head() {
        let (_d, refs) = repo();
        refs.update("HEAD", RefValue::Direct(oid(5)), false).unwrap();
        refs.update("MERGE_HEAD", RefValue::Direct(oid(6)), false)
            .unwrap();
        let all = refs.iter("", true).unwrap();
        let names: Vec<&str> = all.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"HEAD"));
        assert!(names.contains(&"MERGE_HEAD"));
    }

    #[test]
    fn symbolic_cycle_is_rejected() {
        let (_d, refs) = repo();
        refs.update("refs/heads/a", RefValue::Symbolic("refs/heads/b".into()), false)
            .unwrap();
        refs.update("refs/heads/b", RefValue::Symbolic("refs/heads/a".into()), false)
            .unwrap();
        assert!(refs.get("refs/heads/a", true).is_err());
    }
}
