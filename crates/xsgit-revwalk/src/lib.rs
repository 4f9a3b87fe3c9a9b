//! Commit-DAG traversal: first-parent-preferring BFS, merge-base,
//! ancestry tests, and the object closure used by peer sync.
//!
//! No commit-graph acceleration and no topological/author-date sort —
//! just a deque that always drains a commit's first parent before its
//! others, matching a single-pass mainline history view.

use std::collections::{HashSet, VecDeque};

use xsgit_hash::ObjectId;
use xsgit_object::{Commit, ObjectError, ObjectKind};
use xsgit_odb::{ObjectStore, OdbError};

/// Errors produced by revision-walking operations.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error("object is not a commit: {0}")]
    NotACommit(ObjectId),

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Object(#[from] ObjectError),
}

fn get_commit(odb: &ObjectStore, oid: &ObjectId) -> Result<Commit, RevWalkError> {
    let payload = odb.get(oid, Some(ObjectKind::Commit))?;
    match xsgit_object::Object::parse_content(ObjectKind::Commit, &payload)? {
        xsgit_object::Object::Commit(commit) => Ok(commit),
        _ => Err(RevWalkError::NotACommit(*oid)),
    }
}

/// Visit every commit reachable from `starts`, each exactly once.
///
/// A commit's first parent is pushed to the front of the work queue (so
/// it drains before siblings or later starting points); remaining
/// parents go to the back. This gives "mainline first" ordering without
/// needing full topological sort machinery.
pub fn iter_commits_and_parents(
    odb: &ObjectStore,
    starts: impl IntoIterator<Item = ObjectId>,
) -> Result<Vec<ObjectId>, RevWalkError> {
    let mut queue: VecDeque<ObjectId> = starts.into_iter().collect();
    let mut visited = HashSet::new();
    let mut order = Vec::new();

    while let Some(oid) = queue.pop_front() {
        if !visited.insert(oid) {
            continue;
        }
        order.push(oid);

        let commit = get_commit(odb, &oid)?;
        if let Some(&first) = commit.parents.first() {
            queue.push_front(first);
        }
        for &parent in commit.parents.iter().skip(1) {
            queue.push_back(parent);
        }
    }

    Ok(order)
}

/// The nearest common ancestor of `a` and `b`, by first-parent-ordered
/// ancestry: walk `b`'s ancestors and return the first one also in `a`'s
/// ancestor set.
pub fn merge_base(
    odb: &ObjectStore,
    a: ObjectId,
    b: ObjectId,
) -> Result<Option<ObjectId>, RevWalkError> {
    let ancestors_of_a: HashSet<ObjectId> =
        iter_commits_and_parents(odb, [a])?.into_iter().collect();

    for candidate in iter_commits_and_parents(odb, [b])? {
        if ancestors_of_a.contains(&candidate) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Is `maybe_ancestor` reachable from `commit` (inclusive of `commit`
/// itself)?
pub fn is_ancestor_of(
    odb: &ObjectStore,
    commit: ObjectId,
    maybe_ancestor: ObjectId,
) -> Result<bool, RevWalkError> {
    if commit == maybe_ancestor {
        return Ok(true);
    }
    for oid in iter_commits_and_parents(odb, [commit])? {
        if oid == maybe_ancestor {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The full set of objects reachable from `starts`: every commit, every
/// tree and blob in each commit's tree, transitively. This is the
/// object closure peer sync diffs against the destination's objects.
pub fn iter_objects_in_commits(
    odb: &ObjectStore,
    starts: impl IntoIterator<Item = ObjectId>,
) -> Result<HashSet<ObjectId>, RevWalkError> {
    let mut visited = HashSet::new();

    for commit_oid in iter_commits_and_parents(odb, starts)? {
        if !visited.insert(commit_oid) {
            continue;
        }
        let commit = get_commit(odb, &commit_oid)?;
        collect_tree_objects(odb, commit.tree, &mut visited)?;
    }

    Ok(visited)
}

fn collect_tree_objects(
    odb: &ObjectStore,
    tree_oid: ObjectId,
    visited: &mut HashSet<ObjectId>,
) -> Result<(), RevWalkError> {
    if !visited.insert(tree_oid) {
        return Ok(());
    }
    let payload = odb.get(&tree_oid, Some(ObjectKind::Tree))?;
    let tree = match xsgit_object::Object::parse_content(ObjectKind::Tree, &payload)? {
        xsgit_object::Object::Tree(tree) => tree,
        _ => return Err(RevWalkError::NotACommit(tree_oid)),
    };

    for entry in &tree.entries {
        match entry.kind {
            xsgit_object::EntryKind::Blob => {
                visited.insert(entry.oid);
            }
            xsgit_object::EntryKind::Tree => {
                collect_tree_objects(odb, entry.oid, visited)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectStore::new(dir.path().join("objects"));
        odb.init().unwrap();
        (dir, odb)
    }

    fn commit(odb: &ObjectStore, tree: ObjectId, parents: Vec<ObjectId>, msg: &str) -> ObjectId {
        let commit = Commit::new(tree, parents, msg.as_bytes().to_vec());
        odb.put(ObjectKind::Commit, &commit.serialize_content()).unwrap()
    }

    fn empty_tree(odb: &ObjectStore) -> ObjectId {
        odb.put(ObjectKind::Tree, b"").unwrap()
    }

    #[test]
    fn walk_visits_linear_history_once() {
        let (_d, odb) = store();
        let tree = empty_tree(&odb);
        let c1 = commit(&odb, tree, vec![], "first");
        let c2 = commit(&odb, tree, vec![c1], "second");
        let c3 = commit(&odb, tree, vec![c2], "third");

        let order = iter_commits_and_parents(&odb, [c3]).unwrap();
        assert_eq!(order, vec![c3, c2, c1]);
    }

    #[test]
    fn merge_base_finds_common_ancestor() {
        let (_d, odb) = store();
        let tree = empty_tree(&odb);
        let base = commit(&odb, tree, vec![], "base");
        let ours = commit(&odb, tree, vec![base], "ours");
        let theirs = commit(&odb, tree, vec![base], "theirs");

        let mb = merge_base(&odb, ours, theirs).unwrap();
        assert_eq!(mb, Some(base));
    }

    #[test]
    fn merge_base_of_ancestor_and_descendant_is_the_ancestor() {
        let (_d, odb) = store();
        let tree = empty_tree(&odb);
        let c1 = commit(&odb, tree, vec![], "first");
        let c2 = commit(&odb, tree, vec![c1], "second");

        assert_eq!(merge_base(&odb, c1, c2).unwrap(), Some(c1));
    }

    #[test]
    fn is_ancestor_of_checks_reachability() {
        let (_d, odb) = store();
        let tree = empty_tree(&odb);
        let c1 = commit(&odb, tree, vec![], "first");
        let c2 = commit(&odb, tree, vec![c1], "second");

        assert!(is_ancestor_of(&odb, c2, c1).unwrap());
        assert!(!is_ancestor_of(&odb, c1, c2).unwrap());
    }

    #[test]
    fn object_closure_includes_commit_tree_and_blobs() {
        let (_d, odb) = store();
        let blob = odb.put(ObjectKind::Blob, b"hello\n").unwrap();
        let tree_payload = format!("blob {} file.txt\n", blob.to_hex());
        let tree = odb.put(ObjectKind::Tree, tree_payload.as_bytes()).unwrap();
        let c1 = commit(&odb, tree, vec![], "first");

        let closure = iter_objects_in_commits(&odb, [c1]).unwrap();
        assert!(closure.contains(&c1));
        assert!(closure.contains(&tree));
        assert!(closure.contains(&blob));
    }

    #[test]
    fn first_parent_is_drained_before_second_parent_branch() {
        let (_d, odb) = store();
        let tree = empty_tree(&odb);
        let base = commit(&odb, tree, vec![], "base");
        let side = commit(&odb, tree, vec![base], "side");
        let mainline = commit(&odb, tree, vec![base], "mainline");
        let merge = commit(&odb, tree, vec![mainline, side], "merge");

        let order = iter_commits_and_parents(&odb, [merge]).unwrap();
        // mainline (first parent) must be visited before side (second parent).
        let mainline_pos = order.iter().position(|&o| o == mainline).unwrap();
        let side_pos = order.iter().position(|&o| o == side).unwrap();
        assert!(mainline_pos < side_pos);
    }
}
