//! High-level operations (§4.8): the verbs a CLI front end dispatches to.
//! Nothing here is a new algorithm — each operation composes the object
//! store, ref store, index, tree codec, working-tree I/O, and diff/merge
//! engine already provided by the rest of this crate and its siblings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use xsgit_diff::{iter_changed_files, ChangedFile};
use xsgit_hash::ObjectId;
use xsgit_merge::MergeLabels;
use xsgit_object::{Commit, Object, ObjectKind};
use xsgit_ref::RefValue;
use xsgit_revwalk::{iter_commits_and_parents, is_ancestor_of as revwalk_is_ancestor_of, merge_base as revwalk_merge_base};

use crate::{worktree, Repository, RepoError};

/// One entry of `log`'s output: a commit alongside the ref names (if any)
/// that currently point at it.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub oid: ObjectId,
    pub commit: Commit,
    pub refs: Vec<String>,
}

/// One entry of `branch`'s listing.
#[derive(Debug, Clone)]
pub struct BranchEntry {
    pub name: String,
    pub is_current: bool,
}

/// Outcome of a `merge`.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// `HEAD` was simply advanced; no new commit was created.
    FastForward { new_head: ObjectId },
    /// `MERGE_HEAD` was set and the working tree updated; paths in
    /// `conflicts` contain embedded conflict markers awaiting a commit.
    NeedsCommit { conflicts: Vec<String> },
}

/// `status`'s full report.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub branch: Option<String>,
    pub head_oid: Option<ObjectId>,
    pub merge_in_progress: bool,
    pub staged: Vec<ChangedFile>,
    pub not_staged: Vec<ChangedFile>,
}

impl Repository {
    fn get_commit(&self, oid: ObjectId) -> Result<Commit, RepoError> {
        match self.odb.get_object(&oid)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(RepoError::Precondition(format!(
                "expected {oid} to be a commit, found a {}",
                other.kind()
            ))),
        }
    }

    fn tree_of(&self, commit_oid: ObjectId) -> Result<BTreeMap<String, ObjectId>, RepoError> {
        let commit = self.get_commit(commit_oid)?;
        crate::expand_tree(&self.odb, commit.tree)
    }

    /// Stage every file named by `paths`: a file is staged directly, a
    /// directory is walked recursively, skipping the control directory.
    pub fn add(&self, paths: &[impl AsRef<Path>]) -> Result<(), RepoError> {
        self.with_index(|index| {
            for path in paths {
                let path = path.as_ref();
                let metadata = fs::metadata(path)?;
                if metadata.is_file() {
                    self.stage_file(index, path)?;
                } else if metadata.is_dir() {
                    self.stage_directory(index, path)?;
                } else {
                    return Err(RepoError::NotFound(path.display().to_string()));
                }
            }
            Ok(())
        })
    }

    fn stage_file(&self, index: &mut xsgit_index::Index, path: &Path) -> Result<(), RepoError> {
        let rel = self.normalize_path(path)?;
        let bytes = fs::read(path)?;
        let oid = self.odb.put(ObjectKind::Blob, &bytes)?;
        index.set(rel, oid);
        Ok(())
    }

    fn stage_directory(&self, index: &mut xsgit_index::Index, dir: &Path) -> Result<(), RepoError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if self.is_ignored(&path) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.stage_directory(index, &path)?;
            } else if file_type.is_file() {
                self.stage_file(index, &path)?;
            }
        }
        Ok(())
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name == crate::CONTROL_DIR)
            .unwrap_or(false)
    }

    fn normalize_path(&self, path: &Path) -> Result<String, RepoError> {
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let rel = abs
            .strip_prefix(&self.work_dir)
            .unwrap_or(&abs)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");
        Ok(rel)
    }

    /// Build a tree from the current index, chain it onto `HEAD` (and
    /// `MERGE_HEAD`, if present) as parents, and advance the current
    /// branch (or detached `HEAD`) to the new commit.
    pub fn commit(&self, message: &str) -> Result<ObjectId, RepoError> {
        let tree_oid = self.with_index(|index| {
            crate::build_tree_from_index(&self.odb, index.as_map())
        })?;

        let mut parents = Vec::new();
        if let Some(head) = self.refs.resolve_oid("HEAD")? {
            parents.push(head);
        }
        if let Some(merge_head) = self.refs.resolve_oid("MERGE_HEAD")? {
            parents.push(merge_head);
            self.refs.delete("MERGE_HEAD", false)?;
        }

        let commit = Commit::new(tree_oid, parents, message.as_bytes().to_vec());
        let oid = self.odb.put(ObjectKind::Commit, &commit.serialize_content())?;
        self.refs.update("HEAD", RefValue::Direct(oid), true)?;
        Ok(oid)
    }

    /// Resolve `name`, expand its tree into the index and working tree,
    /// and point `HEAD` at it — symbolically if `name` names a branch,
    /// concretely (detached) otherwise.
    pub fn checkout(&self, name: &str) -> Result<(), RepoError> {
        let oid = self.resolve_name(name)?;
        let commit = self.get_commit(oid)?;
        let entries = crate::expand_tree(&self.odb, commit.tree)?;

        self.with_index(|index| {
            index.replace_all(entries.clone());
            Ok(())
        })?;
        worktree::materialize_index(&self.odb, &self.work_dir, &self.control_dir, &entries)?;

        let head = if self.is_branch(name)? {
            RefValue::Symbolic(format!("refs/heads/{name}"))
        } else {
            RefValue::Direct(oid)
        };
        self.refs.update("HEAD", head, false)?;
        Ok(())
    }

    /// Point `HEAD` directly at `oid`, detaching it if it was previously
    /// symbolic. The working tree and index are left untouched.
    pub fn reset(&self, oid: ObjectId) -> Result<(), RepoError> {
        self.refs.update("HEAD", RefValue::Direct(oid), false)
    }

    pub fn tag(&self, name: &str, oid: ObjectId) -> Result<(), RepoError> {
        self.refs
            .update(&format!("refs/tags/{name}"), RefValue::Direct(oid), true)
    }

    /// List local branches, marking whichever one `HEAD` currently
    /// points at.
    pub fn branch_list(&self) -> Result<Vec<BranchEntry>, RepoError> {
        let current = self.current_branch()?;
        let mut entries = Vec::new();
        for (name, _) in self.refs.iter("refs/heads/", true)? {
            let short = name
                .strip_prefix("refs/heads/")
                .unwrap_or(&name)
                .to_string();
            entries.push(BranchEntry {
                is_current: current.as_deref() == Some(short.as_str()),
                name: short,
            });
        }
        Ok(entries)
    }

    pub fn branch_create(&self, name: &str, start: ObjectId) -> Result<(), RepoError> {
        self.refs
            .update(&format!("refs/heads/{name}"), RefValue::Direct(start), true)
    }

    /// Walk the commit DAG from `start` (§4.5), pairing each commit with
    /// the names of any refs that currently point at it.
    pub fn log(&self, start: ObjectId) -> Result<Vec<LogEntry>, RepoError> {
        let ref_names_by_oid = self.refs_by_oid()?;
        let mut entries = Vec::new();
        for oid in iter_commits_and_parents(&self.odb, [start])? {
            let commit = self.get_commit(oid)?;
            let refs = ref_names_by_oid.get(&oid).cloned().unwrap_or_default();
            entries.push(LogEntry { oid, commit, refs });
        }
        Ok(entries)
    }

    fn refs_by_oid(&self) -> Result<BTreeMap<ObjectId, Vec<String>>, RepoError> {
        let mut map: BTreeMap<ObjectId, Vec<String>> = BTreeMap::new();
        for (name, value) in self.refs.iter("", true)? {
            if let Some(oid) = value.as_oid() {
                map.entry(oid).or_default().push(name);
            }
        }
        Ok(map)
    }

    /// The commit plus a unified diff of its tree against its first
    /// parent's tree (or the empty tree, for a root commit).
    pub fn show(&self, oid: ObjectId) -> Result<(Commit, Vec<u8>), RepoError> {
        let commit = self.get_commit(oid)?;
        let new_tree = crate::expand_tree(&self.odb, commit.tree)?;
        let old_tree = match commit.first_parent() {
            Some(&parent) => self.tree_of(parent)?,
            None => BTreeMap::new(),
        };

        let mut diff_bytes = Vec::new();
        for changed in iter_changed_files(&old_tree, &new_tree) {
            diff_bytes.extend(xsgit_diff::text_diff(
                &self.odb,
                &changed.path,
                changed.old_oid,
                changed.new_oid,
            )?);
        }
        Ok((commit, diff_bytes))
    }

    /// Branch/detached-HEAD, in-progress merge, and the staged/unstaged
    /// changed-file lists (HEAD-tree vs. index, index vs. working tree).
    pub fn status(&self) -> Result<StatusReport, RepoError> {
        let branch = self.current_branch()?;
        let head_oid = self.refs.resolve_oid("HEAD")?;
        let merge_in_progress = self.refs.get("MERGE_HEAD", false)?.is_some();

        let head_tree = match head_oid {
            Some(oid) => self.tree_of(oid)?,
            None => BTreeMap::new(),
        };
        let index_map = self.with_index(|index| Ok(index.as_map().clone()))?;
        let working_tree = worktree::scan_working_tree(&self.odb, &self.work_dir, &self.control_dir)?;

        Ok(StatusReport {
            branch,
            head_oid,
            merge_in_progress,
            staged: iter_changed_files(&head_tree, &index_map),
            not_staged: iter_changed_files(&index_map, &working_tree),
        })
    }

    /// Fast-forward when possible; otherwise stage a three-way merge
    /// (§4.7) into the index and working tree and leave `MERGE_HEAD` set
    /// for the user to resolve and commit.
    pub fn merge(&self, other: ObjectId) -> Result<MergeOutcome, RepoError> {
        let head = self
            .refs
            .resolve_oid("HEAD")?
            .ok_or_else(|| RepoError::Precondition("HEAD does not resolve to a commit".into()))?;
        let base = revwalk_merge_base(&self.odb, head, other)?;

        if base == Some(head) {
            let commit_other = self.get_commit(other)?;
            let entries = crate::expand_tree(&self.odb, commit_other.tree)?;
            self.with_index(|index| {
                index.replace_all(entries.clone());
                Ok(())
            })?;
            worktree::materialize_index(&self.odb, &self.work_dir, &self.control_dir, &entries)?;
            self.refs.update("HEAD", RefValue::Direct(other), true)?;
            return Ok(MergeOutcome::FastForward { new_head: other });
        }

        self.refs.update("MERGE_HEAD", RefValue::Direct(other), false)?;

        let base_tree = match base {
            Some(base_oid) => self.tree_of(base_oid)?,
            None => BTreeMap::new(),
        };
        let head_tree = self.tree_of(head)?;
        let other_tree = self.tree_of(other)?;

        let labels = MergeLabels {
            ours: "HEAD",
            theirs: "MERGE_HEAD",
        };
        let merged = xsgit_merge::merge_trees(&self.odb, &base_tree, &head_tree, &other_tree, &labels)?;

        self.with_index(|index| {
            index.replace_all(merged.entries.clone());
            Ok(())
        })?;
        worktree::materialize_index(&self.odb, &self.work_dir, &self.control_dir, &merged.entries)?;

        Ok(MergeOutcome::NeedsCommit {
            conflicts: merged.conflicts,
        })
    }

    pub fn merge_base(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>, RepoError> {
        Ok(revwalk_merge_base(&self.odb, a, b)?)
    }

    pub fn is_ancestor_of(&self, commit: ObjectId, maybe_ancestor: ObjectId) -> Result<bool, RepoError> {
        Ok(revwalk_is_ancestor_of(&self.odb, commit, maybe_ancestor)?)
    }
}
