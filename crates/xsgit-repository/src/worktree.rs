//! Scan, empty, and materialize the working directory against an index
//! (§4.6). All three walk the tree relative to the repository's working
//! directory and skip the control directory entirely.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use xsgit_hash::ObjectId;
use xsgit_object::ObjectKind;
use xsgit_odb::ObjectStore;

use crate::RepoError;

fn is_control_dir(entry_name: &std::ffi::OsStr, control_name: &std::ffi::OsStr) -> bool {
    entry_name == control_name
}

/// Walk `work_dir`, hashing every regular file below it (except anything
/// under the control directory) into the object store and returning the
/// resulting `path -> blob_oid` map, with forward-slash, `./`-free paths.
pub fn scan_working_tree(
    odb: &ObjectStore,
    work_dir: &Path,
    control_dir: &Path,
) -> Result<BTreeMap<String, ObjectId>, RepoError> {
    let mut out = BTreeMap::new();
    walk(odb, work_dir, work_dir, control_dir, &mut out)?;
    Ok(out)
}

fn walk(
    odb: &ObjectStore,
    dir: &Path,
    work_dir: &Path,
    control_dir: &Path,
    out: &mut BTreeMap<String, ObjectId>,
) -> Result<(), RepoError> {
    let control_name = control_dir.file_name().expect("control dir has a name");

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if dir == work_dir && is_control_dir(&entry.file_name(), control_name) {
                continue;
            }
            walk(odb, &path, work_dir, control_dir, out)?;
        } else if file_type.is_file() {
            let rel = path
                .strip_prefix(work_dir)
                .expect("entry is under work_dir")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            let bytes = fs::read(&path)?;
            let oid = odb.put(ObjectKind::Blob, &bytes)?;
            out.insert(rel, oid);
        }
    }
    Ok(())
}

/// Remove every file and now-empty directory below `work_dir`, except
/// the control directory subtree. Directories left non-empty by an
/// ignored child are left in place.
pub fn empty_working_tree(work_dir: &Path, control_dir: &Path) -> Result<(), RepoError> {
    let control_name = control_dir.file_name().expect("control dir has a name");
    remove_contents(work_dir, work_dir, control_name)
}

fn remove_contents(
    dir: &Path,
    work_dir: &Path,
    control_name: &std::ffi::OsStr,
) -> Result<(), RepoError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if dir == work_dir && is_control_dir(&entry.file_name(), control_name) {
                continue;
            }
            remove_contents(&path, work_dir, control_name)?;
            let _ = fs::remove_dir(&path);
        } else if file_type.is_file() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Empty the working tree, then write out every `(path, oid)` pair in
/// `entries` as a blob read back from the object store.
pub fn materialize_index(
    odb: &ObjectStore,
    work_dir: &Path,
    control_dir: &Path,
    entries: &BTreeMap<String, ObjectId>,
) -> Result<(), RepoError> {
    empty_working_tree(work_dir, control_dir)?;
    for (path, oid) in entries {
        let dest = relative_to(work_dir, path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = odb.get_blob(oid)?;
        fs::write(&dest, bytes)?;
    }
    Ok(())
}

fn relative_to(work_dir: &Path, repo_relative: &str) -> PathBuf {
    work_dir.join(repo_relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_dirs() -> (tempfile::TempDir, PathBuf, PathBuf, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().to_path_buf();
        let control_dir = work_dir.join(".xsgit");
        let odb = ObjectStore::new(control_dir.join("objects"));
        odb.init().unwrap();
        (dir, work_dir, control_dir, odb)
    }

    #[test]
    fn scan_skips_control_directory() {
        let (_d, work_dir, control_dir, odb) = repo_dirs();
        fs::write(work_dir.join("a.txt"), b"hello\n").unwrap();
        fs::create_dir_all(control_dir.join("objects")).unwrap();
        fs::write(control_dir.join("index"), b"{}").unwrap();

        let scanned = scan_working_tree(&odb, &work_dir, &control_dir).unwrap();
        assert_eq!(scanned.len(), 1);
        assert!(scanned.contains_key("a.txt"));
    }

    #[test]
    fn scan_finds_nested_files_with_forward_slash_paths() {
        let (_d, work_dir, control_dir, odb) = repo_dirs();
        fs::create_dir_all(work_dir.join("dir/sub")).unwrap();
        fs::write(work_dir.join("dir/sub/b.txt"), b"nested\n").unwrap();

        let scanned = scan_working_tree(&odb, &work_dir, &control_dir).unwrap();
        assert!(scanned.contains_key("dir/sub/b.txt"));
    }

    #[test]
    fn materialize_then_scan_round_trips() {
        let (_d, work_dir, control_dir, odb) = repo_dirs();
        let oid1 = odb.put(ObjectKind::Blob, b"one\n").unwrap();
        let oid2 = odb.put(ObjectKind::Blob, b"two\n").unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("a.txt".to_string(), oid1);
        entries.insert("dir/b.txt".to_string(), oid2);

        materialize_index(&odb, &work_dir, &control_dir, &entries).unwrap();
        let scanned = scan_working_tree(&odb, &work_dir, &control_dir).unwrap();
        assert_eq!(scanned, entries);
    }

    #[test]
    fn empty_working_tree_preserves_control_directory() {
        let (_d, work_dir, control_dir, _odb) = repo_dirs();
        fs::create_dir_all(control_dir.join("objects")).unwrap();
        fs::write(work_dir.join("a.txt"), b"x").unwrap();

        empty_working_tree(&work_dir, &control_dir).unwrap();
        assert!(!work_dir.join("a.txt").exists());
        assert!(control_dir.join("objects").exists());
    }
}
