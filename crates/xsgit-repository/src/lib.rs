//! Ties the object store, reference store, and index together into a
//! single repository handle, and implements the high-level operations
//! built on top of them (`mod ops`).
//!
//! A repository is rooted at `<work_dir>/.xsgit/`. Everything else in
//! this crate — the flat/nested tree conversion (`mod tree`) and the
//! working-tree scan/empty/materialize trio (`mod worktree`) — exists to
//! support `ops`.

mod error;
mod ops;
mod tree;
mod worktree;

pub use error::RepoError;
pub use tree::{build_tree_from_index, expand_tree};
pub use worktree::{empty_working_tree, materialize_index, scan_working_tree};

pub use ops::{
    BranchEntry, LogEntry, MergeOutcome, StatusReport,
};

use std::path::{Path, PathBuf};

use xsgit_hash::ObjectId;
use xsgit_index::Index;
use xsgit_odb::ObjectStore;
use xsgit_ref::{RefStore, RefValue};

/// Name of the repository control directory inside the working tree.
pub const CONTROL_DIR: &str = ".xsgit";

/// Name of the main branch an `init`ialized repository starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// A single repository: a working directory paired with its `.xsgit`
/// control directory, plus handles onto the object store and ref store
/// rooted there.
pub struct Repository {
    work_dir: PathBuf,
    control_dir: PathBuf,
    odb: ObjectStore,
    refs: RefStore,
}

impl Repository {
    /// Create a new repository at `work_dir`. Fails only on I/O error;
    /// re-initializing an existing repository is not rejected (matching
    /// the object store's idempotent-write philosophy), though it will
    /// clobber `HEAD` back to an unborn `main`.
    pub fn init(work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let work_dir = work_dir.into();
        let control_dir = work_dir.join(CONTROL_DIR);
        std::fs::create_dir_all(&control_dir)?;

        let odb = ObjectStore::new(control_dir.join("objects"));
        odb.init()?;
        let refs = RefStore::new(&control_dir);
        refs.update(
            "HEAD",
            RefValue::Symbolic(format!("refs/heads/{DEFAULT_BRANCH}")),
            false,
        )?;

        Ok(Self {
            work_dir,
            control_dir,
            odb,
            refs,
        })
    }

    /// Open an existing repository at `work_dir`. Fails with
    /// `NotARepository` if no control directory is present.
    pub fn open(work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let work_dir = work_dir.into();
        let control_dir = work_dir.join(CONTROL_DIR);
        if !control_dir.is_dir() {
            return Err(RepoError::NotARepository(work_dir));
        }

        Ok(Self {
            odb: ObjectStore::new(control_dir.join("objects")),
            refs: RefStore::new(&control_dir),
            control_dir,
            work_dir,
        })
    }

    /// Walk upward from `start` looking for a `.xsgit` control directory,
    /// the way most command-line entry points locate the repository that
    /// contains the current directory.
    pub fn discover(start: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let mut dir = start.into();
        loop {
            if dir.join(CONTROL_DIR).is_dir() {
                return Self::open(dir);
            }
            if !dir.pop() {
                return Err(RepoError::NotARepository(std::env::current_dir()?));
            }
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn control_dir(&self) -> &Path {
        &self.control_dir
    }

    pub fn odb(&self) -> &ObjectStore {
        &self.odb
    }

    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    fn index_path(&self) -> PathBuf {
        self.control_dir.join("index")
    }

    /// Scoped acquisition (§4.3): load the index, let `f` mutate it, and
    /// save it back. A plain read uses `f` that returns without mutating.
    pub fn with_index<T>(
        &self,
        f: impl FnOnce(&mut Index) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let path = self.index_path();
        let mut index = Index::load(&path)?;
        let result = f(&mut index)?;
        index.save(&path)?;
        Ok(result)
    }

    /// Resolve a user-supplied name to an OID (§4.8 "Name resolution").
    ///
    /// Tries, in order: `@` substituted for `HEAD`, then the literal
    /// name, `refs/<name>`, `refs/tags/<name>`, `refs/heads/<name>` as
    /// reference names; the first one that exists wins. Falls back to
    /// treating `name` as a raw 40-hex OID.
    pub fn resolve_name(&self, name: &str) -> Result<ObjectId, RepoError> {
        let name = if name == "@" { "HEAD" } else { name };

        let candidates = [
            name.to_string(),
            format!("refs/{name}"),
            format!("refs/tags/{name}"),
            format!("refs/heads/{name}"),
        ];

        for candidate in &candidates {
            if self.refs.get(candidate, false)?.is_some() {
                if let Some(oid) = self.refs.resolve_oid(candidate)? {
                    return Ok(oid);
                }
            }
        }

        if ObjectId::looks_like_oid(name) {
            return Ok(ObjectId::from_hex(name)?);
        }

        Err(RepoError::NotFound(name.to_string()))
    }

    /// Is `branch` a known local branch name?
    pub fn is_branch(&self, branch: &str) -> Result<bool, RepoError> {
        Ok(self
            .refs
            .get(&format!("refs/heads/{branch}"), false)?
            .is_some())
    }

    /// The branch `HEAD` currently points at, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        match self.refs.get("HEAD", false)? {
            Some(RefValue::Symbolic(target)) => Ok(target
                .strip_prefix("refs/heads/")
                .map(ToString::to_string)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_head_to_unborn_main() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert_eq!(
            repo.refs().get("HEAD", false).unwrap(),
            Some(RefValue::Symbolic("refs/heads/main".into()))
        );
        assert!(repo.refs().get("HEAD", true).unwrap().is_none());
    }

    #[test]
    fn open_without_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn discover_walks_up_to_the_control_directory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover(nested).unwrap();
        assert_eq!(repo.work_dir(), dir.path());
    }

    #[test]
    fn resolve_name_accepts_head_alias() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = repo.odb().put(xsgit_object::ObjectKind::Commit, b"tree 0\n\nx\n");
        let oid = oid.unwrap_or_else(|_| panic!("put should not fail"));
        repo.refs()
            .update("refs/heads/main", RefValue::Direct(oid), true)
            .unwrap();
        assert_eq!(repo.resolve_name("@").unwrap(), oid);
        assert_eq!(repo.resolve_name("main").unwrap(), oid);
    }

    #[test]
    fn resolve_name_falls_back_to_raw_oid() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let hex = "0000000000000000000000000000000000000001";
        assert_eq!(repo.resolve_name(hex).unwrap().to_hex(), hex);
    }

    #[test]
    fn resolve_name_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(
            repo.resolve_name("nope"),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn with_index_persists_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = ObjectId::hash_framed("blob", b"x");
        repo.with_index(|index| {
            index.set("a.txt", oid);
            Ok(())
        })
        .unwrap();

        let seen = repo
            .with_index(|index| Ok(index.get("a.txt")))
            .unwrap();
        assert_eq!(seen, Some(oid));
    }
}
