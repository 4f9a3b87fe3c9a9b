//! Peer sync (§4.9): fetch and push object closures between two local
//! repositories reached by filesystem path.
//!
//! A "remote" is nothing more than another `Repository` handle rooted at
//! a different working directory — there is no network transport, no
//! authentication, and no pack-file compression; objects are copied one
//! loose file at a time.

use xsgit_hash::ObjectId;
use xsgit_ref::RefValue;
use xsgit_repository::{RepoError, Repository};
use xsgit_revwalk::iter_objects_in_commits;

/// Reference namespace branches live under, both locally and on a remote.
pub const REMOTE_REFS_BASE: &str = "refs/heads/";

/// Reference namespace a fetch mirrors the remote's branches into.
pub const LOCAL_REFS_BASE: &str = "refs/remote/";

/// Errors produced by peer-sync operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("local ref '{0}' does not resolve to a commit")]
    UnresolvedLocalRef(String),

    #[error("push rejected: {local} is not a descendant of remote {refname} ({remote})")]
    NonFastForward {
        refname: String,
        local: ObjectId,
        remote: ObjectId,
    },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Enumerate the remote's `refs/heads/*`, compute the object closure over
/// their tips, copy every object missing locally, then mirror each
/// remote branch into `refs/remote/<name>` locally.
pub fn fetch(local: &Repository, remote: &Repository) -> Result<(), RemoteError> {
    let remote_branches = remote.refs().iter(REMOTE_REFS_BASE, true)?;
    let tips: Vec<ObjectId> = remote_branches
        .iter()
        .filter_map(|(_, value)| value.as_oid())
        .collect();

    for oid in iter_objects_in_commits(remote.odb(), tips)? {
        if !local.odb().exists(&oid) {
            local.odb().copy_from(remote.odb(), &oid)?;
        }
    }

    for (name, value) in &remote_branches {
        let Some(oid) = value.as_oid() else { continue };
        let short = name.strip_prefix(REMOTE_REFS_BASE).unwrap_or(name);
        local.refs().update(
            &format!("{LOCAL_REFS_BASE}{short}"),
            RefValue::Direct(oid),
            true,
        )?;
    }

    Ok(())
}

/// Push the local concrete value of `refname` (e.g. `refs/heads/main`) to
/// the same ref name on `remote`. Refused (non-fast-forward) unless the
/// remote ref is absent or the local commit is its descendant.
pub fn push(local: &Repository, remote: &Repository, refname: &str) -> Result<(), RemoteError> {
    let local_oid = local
        .refs()
        .resolve_oid(refname)?
        .ok_or_else(|| RemoteError::UnresolvedLocalRef(refname.to_string()))?;

    let remote_branches = remote.refs().iter(REMOTE_REFS_BASE, true)?;
    let remote_tip = remote_branches
        .iter()
        .find(|(name, _)| name == refname)
        .and_then(|(_, value)| value.as_oid());

    if let Some(remote_oid) = remote_tip {
        if !local.is_ancestor_of(local_oid, remote_oid)? {
            return Err(RemoteError::NonFastForward {
                refname: refname.to_string(),
                local: local_oid,
                remote: remote_oid,
            });
        }
    }

    let known_remote_tips = remote_branches
        .iter()
        .filter_map(|(_, value)| value.as_oid())
        .filter(|oid| local.odb().exists(oid));
    let remote_objects = iter_objects_in_commits(local.odb(), known_remote_tips)?;
    let local_objects = iter_objects_in_commits(local.odb(), [local_oid])?;

    for oid in local_objects.difference(&remote_objects) {
        remote.odb().copy_from(local.odb(), oid)?;
    }

    remote
        .refs()
        .update(refname, RefValue::Direct(local_oid), true)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &std::path::Path, rel: &str, content: &[u8]) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn fetch_copies_objects_and_mirrors_branches() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = Repository::init(local_dir.path()).unwrap();
        let remote = Repository::init(remote_dir.path()).unwrap();

        write_file(remote_dir.path(), "a.txt", b"hello\n");
        remote.add(&[remote_dir.path().join("a.txt")]).unwrap();
        let c1 = remote.commit("c1").unwrap();

        fetch(&local, &remote).unwrap();

        assert!(local.odb().exists(&c1));
        assert_eq!(
            local.refs().resolve_oid("refs/remote/main").unwrap(),
            Some(c1)
        );
    }

    #[test]
    fn push_updates_remote_ref_and_copies_objects() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = Repository::init(local_dir.path()).unwrap();
        let remote = Repository::init(remote_dir.path()).unwrap();

        write_file(local_dir.path(), "a.txt", b"hello\n");
        local.add(&[local_dir.path().join("a.txt")]).unwrap();
        let c1 = local.commit("c1").unwrap();

        push(&local, &remote, "refs/heads/main").unwrap();

        assert!(remote.odb().exists(&c1));
        assert_eq!(
            remote.refs().resolve_oid("refs/heads/main").unwrap(),
            Some(c1)
        );
    }

    #[test]
    fn push_rejects_non_fast_forward() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = Repository::init(local_dir.path()).unwrap();
        let remote = Repository::init(remote_dir.path()).unwrap();

        write_file(remote_dir.path(), "a.txt", b"1\n");
        remote.add(&[remote_dir.path().join("a.txt")]).unwrap();
        remote.commit("remote c1").unwrap();
        write_file(remote_dir.path(), "a.txt", b"2\n");
        remote.add(&[remote_dir.path().join("a.txt")]).unwrap();
        remote.commit("remote c2").unwrap();

        write_file(local_dir.path(), "b.txt", b"local\n");
        local.add(&[local_dir.path().join("b.txt")]).unwrap();
        local.commit("local c1").unwrap();

        let result = push(&local, &remote, "refs/heads/main");
        assert!(matches!(result, Err(RemoteError::NonFastForward { .. })));
    }

    #[test]
    fn push_to_empty_remote_ref_always_succeeds() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let local = Repository::init(local_dir.path()).unwrap();
        let remote = Repository::init(remote_dir.path()).unwrap();

        write_file(local_dir.path(), "a.txt", b"x\n");
        local.add(&[local_dir.path().join("a.txt")]).unwrap();
        local.commit("c1").unwrap();

        assert!(push(&local, &remote, "refs/heads/main").is_ok());
    }
}
