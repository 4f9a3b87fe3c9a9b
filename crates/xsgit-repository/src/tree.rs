//! Conversion between the flat `path -> blob OID` form (the index's shape,
//! and the form everything else in this crate operates on) and the nested
//! tree objects §4.4 stores on disk.
//!
//! This lives here rather than in `xsgit-object` because both directions
//! need the object store: building writes every intermediate tree,
//! expanding reads every intermediate tree. `xsgit-object`'s `Tree` type
//! only knows how to parse/serialize a single already-flat entry listing.

use std::collections::BTreeMap;

use xsgit_hash::ObjectId;
use xsgit_object::{EntryKind, Object, ObjectKind, Tree, TreeEntry};
use xsgit_odb::ObjectStore;

use crate::RepoError;

/// A directory node in the nested shape built transiently from an index.
enum Node {
    Blob(ObjectId),
    Dir(BTreeMap<String, Node>),
}

fn nest(entries: &BTreeMap<String, ObjectId>) -> BTreeMap<String, Node> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for (path, &oid) in entries {
        insert(&mut root, path.split('/'), oid);
    }
    root
}

fn insert<'a>(node: &mut BTreeMap<String, Node>, mut parts: impl Iterator<Item = &'a str>, oid: ObjectId) {
    let head = parts.next().expect("path has at least one segment");
    match parts.next() {
        None => {
            node.insert(head.to_string(), Node::Blob(oid));
        }
        Some(next) => {
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            let Node::Dir(child) = child else {
                unreachable!("index paths cannot alias a blob and a directory")
            };
            insert(child, std::iter::once(next).chain(parts), oid);
        }
    }
}

/// Build (§4.4 "Build"): recursively hash a nested directory bottom-up,
/// writing one `tree` object per directory, and return the root OID.
pub fn build_tree_from_index(
    odb: &ObjectStore,
    entries: &BTreeMap<String, ObjectId>,
) -> Result<ObjectId, RepoError> {
    write_node(odb, &nest(entries))
}

fn write_node(odb: &ObjectStore, dir: &BTreeMap<String, Node>) -> Result<ObjectId, RepoError> {
    let mut tree = Tree::new();
    for (name, node) in dir {
        let (kind, oid) = match node {
            Node::Blob(oid) => (EntryKind::Blob, *oid),
            Node::Dir(children) => (EntryKind::Tree, write_node(odb, children)?),
        };
        tree.entries.push(TreeEntry {
            kind,
            oid,
            name: name.clone(),
        });
    }
    Ok(odb.put(ObjectKind::Tree, &tree.serialize_content())?)
}

/// Expand (§4.4 "Expand"): recursively descend a root tree, concatenating
/// path segments with `/`, and return the flat `path -> blob OID` map.
pub fn expand_tree(odb: &ObjectStore, tree_oid: ObjectId) -> Result<BTreeMap<String, ObjectId>, RepoError> {
    let mut out = BTreeMap::new();
    expand_into(odb, tree_oid, "", &mut out)?;
    Ok(out)
}

fn expand_into(
    odb: &ObjectStore,
    tree_oid: ObjectId,
    prefix: &str,
    out: &mut BTreeMap<String, ObjectId>,
) -> Result<(), RepoError> {
    let payload = odb.get(&tree_oid, Some(ObjectKind::Tree))?;
    let Object::Tree(tree) = Object::parse_content(ObjectKind::Tree, &payload)? else {
        unreachable!("get() already checked the kind tag")
    };

    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.kind {
            EntryKind::Blob => {
                out.insert(path, entry.oid);
            }
            EntryKind::Tree => expand_into(odb, entry.oid, &path, out)?,
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

    #[test]
    fn empty_index_builds_the_empty_tree() {
        let (_d, odb) = store();
        let oid = build_tree_from_index(&odb, &BTreeMap::new()).unwrap();
        assert_eq!(oid.to_hex(), "d28c5ff92df044a522508a29cf3fad0b812f672f");
    }

    #[test]
    fn build_then_expand_is_the_identity() {
        let (_d, odb) = store();
        let blob1 = odb.put(ObjectKind::Blob, b"hello\n").unwrap();
        let blob2 = odb.put(ObjectKind::Blob, b"world\n").unwrap();

        let mut index = BTreeMap::new();
        index.insert("a.txt".to_string(), blob1);
        index.insert("dir/b.txt".to_string(), blob2);
        index.insert("dir/sub/c.txt".to_string(), blob1);

        let tree_oid = build_tree_from_index(&odb, &index).unwrap();
        let expanded = expand_tree(&odb, tree_oid).unwrap();
        assert_eq!(expanded, index);
    }

    #[test]
    fn nested_directories_hash_independently() {
        let (_d, odb) = store();
        let blob = odb.put(ObjectKind::Blob, b"x").unwrap();
        let mut index = BTreeMap::new();
        index.insert("dir/a.txt".to_string(), blob);

        let tree_oid = build_tree_from_index(&odb, &index).unwrap();
        let payload = odb.get(&tree_oid, Some(ObjectKind::Tree)).unwrap();
        let Object::Tree(root) = Object::parse_content(ObjectKind::Tree, &payload).unwrap() else {
            unreachable!()
        };
        assert_eq!(root.entries.len(), 1);
        assert_eq!(root.entries[0].kind, EntryKind::Tree);
        assert_eq!(root.entries[0].name, "dir");
    }
}
