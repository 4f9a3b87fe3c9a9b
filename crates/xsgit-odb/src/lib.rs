//! A flat content-addressed object store: `<repo>/objects/<oid>`.
//!
//! One file per object, no compression and no fan-out subdirectory, unlike
//! C git's loose-object layout. The framed record is `kind NUL payload`;
//! the OID is the SHA-1 of the entire framed record.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use xsgit_hash::ObjectId;
use xsgit_object::{Object, ObjectError, ObjectKind};

/// Errors produced by object store operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("object {oid} is corrupt: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("expected object {oid} to be a {expected}, found {actual}")]
    KindMismatch {
        oid: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A content-addressed object store rooted at `<repo>/objects/`.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    /// Create the `objects/` directory if it does not already exist.
    pub fn init(&self) -> Result<(), OdbError> {
        fs::create_dir_all(&self.objects_dir).map_err(|e| OdbError::IoPath {
            path: self.objects_dir.clone(),
            source: e,
        })
    }

    fn path_for(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.to_hex())
    }

    /// Does an object with this OID already exist?
    pub fn exists(&self, oid: &ObjectId) -> bool {
        self.path_for(oid).is_file()
    }

    /// Frame `payload` with `kind`, hash it, and write it to disk.
    ///
    /// Writing an object that already exists is a no-op (idempotent):
    /// the write is skipped entirely rather than rewritten.
    pub fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId, OdbError> {
        let oid = ObjectId::hash_framed(kind.as_str(), payload);
        if self.exists(&oid) {
            return Ok(oid);
        }

        let mut framed = Vec::with_capacity(kind.as_str().len() + 1 + payload.len());
        framed.extend_from_slice(kind.as_str().as_bytes());
        framed.push(0);
        framed.extend_from_slice(payload);

        self.write_atomic(&oid, &framed)?;
        Ok(oid)
    }

    /// Convenience wrapper: hash and store a parsed `Object`.
    pub fn put_object(&self, object: &Object) -> Result<ObjectId, OdbError> {
        self.put(object.kind(), &object.serialize_content())
    }

    fn write_atomic(&self, oid: &ObjectId, framed: &[u8]) -> Result<(), OdbError> {
        self.init()?;
        let final_path = self.path_for(oid);
        let tmp_path = self
            .objects_dir
            .join(format!(".tmp-{}-{}", oid.to_hex(), std::process::id()));

        let mut file = fs::File::create(&tmp_path).map_err(|e| OdbError::IoPath {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(framed).map_err(|e| OdbError::IoPath {
            path: tmp_path.clone(),
            source: e,
        })?;
        drop(file);

        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(_) if final_path.is_file() => {
                let _ = fs::remove_file(&tmp_path);
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(OdbError::IoPath {
                    path: final_path,
                    source: e,
                })
            }
        }
    }

    /// Read the framed record and split it into `(kind, payload)`.
    ///
    /// When `expected` is given, a kind mismatch is a fatal `KindMismatch`.
    pub fn get(
        &self,
        oid: &ObjectId,
        expected: Option<ObjectKind>,
    ) -> Result<Vec<u8>, OdbError> {
        let path = self.path_for(oid);
        let framed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OdbError::NotFound(*oid)
            } else {
                OdbError::IoPath {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let nul = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| OdbError::Corrupt {
                oid: *oid,
                reason: "no NUL byte in framed record".into(),
            })?;
        let kind_str = std::str::from_utf8(&framed[..nul]).map_err(|_| OdbError::Corrupt {
            oid: *oid,
            reason: "non-UTF8 kind tag".into(),
        })?;
        let kind = ObjectKind::from_str(kind_str).map_err(|_| OdbError::Corrupt {
            oid: *oid,
            reason: format!("unknown object kind '{kind_str}'"),
        })?;

        if let Some(expected) = expected {
            if kind != expected {
                return Err(OdbError::KindMismatch {
                    oid: *oid,
                    expected,
                    actual: kind,
                });
            }
        }

        Ok(framed[nul + 1..].to_vec())
    }

    /// Read and fully parse an object, verifying its kind against its payload.
    pub fn get_object(&self, oid: &ObjectId) -> Result<Object, OdbError> {
        let path = self.path_for(oid);
        let framed = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OdbError::NotFound(*oid)
            } else {
                OdbError::IoPath {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;
        let nul = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| OdbError::Corrupt {
                oid: *oid,
                reason: "no NUL byte in framed record".into(),
            })?;
        let kind_str = std::str::from_utf8(&framed[..nul]).map_err(|_| OdbError::Corrupt {
            oid: *oid,
            reason: "non-UTF8 kind tag".into(),
        })?;
        let kind = ObjectKind::from_str(kind_str).map_err(|_| OdbError::Corrupt {
            oid: *oid,
            reason: format!("unknown object kind '{kind_str}'"),
        })?;
        Ok(Object::parse_content(kind, &framed[nul + 1..])?)
    }

    /// Read a blob's raw bytes, one step shorter than `get_object` for the
    /// common case of fetching file content.
    pub fn get_blob(&self, oid: &ObjectId) -> Result<Vec<u8>, OdbError> {
        self.get(oid, Some(ObjectKind::Blob))
    }

    /// Copy a single object's file verbatim from another store (used by
    /// peer sync, which never re-derives OIDs — it trusts the source).
    pub fn copy_from(&self, source: &ObjectStore, oid: &ObjectId) -> Result<(), OdbError> {
        if self.exists(oid) {
            return Ok(());
        }
        let framed = fs::read(source.path_for(oid)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OdbError::NotFound(*oid)
            } else {
                OdbError::IoPath {
                    path: source.path_for(oid),
                    source: e,
                }
            }
        })?;
        self.write_atomic(oid, &framed)
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"));
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_roundtrip() {
        let (_dir, store) = store();
        let oid = store.put(ObjectKind::Blob, b"hello\n").unwrap();
        assert_eq!(oid.to_hex(), "a921a1ed31bcddeb5a51085e5d7dbdc7cf86b905");
        let payload = store.get(&oid, Some(ObjectKind::Blob)).unwrap();
        assert_eq!(payload, b"hello\n");
    }

    #[test]
    fn put_is_idempotent() {
        let (_dir, store) = store();
        let first = store.put(ObjectKind::Blob, b"x").unwrap();
        let second = store.put(ObjectKind::Blob, b"x").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, store) = store();
        let oid = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        assert!(matches!(
            store.get(&oid, None).unwrap_err(),
            OdbError::NotFound(_)
        ));
    }

    #[test]
    fn kind_mismatch_is_fatal() {
        let (_dir, store) = store();
        let oid = store.put(ObjectKind::Blob, b"data").unwrap();
        assert!(matches!(
            store.get(&oid, Some(ObjectKind::Tree)).unwrap_err(),
            OdbError::KindMismatch { .. }
        ));
    }

    #[test]
    fn exists_reflects_writes() {
        let (_dir, store) = store();
        let oid = ObjectId::hash_framed("blob", b"x");
        assert!(!store.exists(&oid));
        store.put(ObjectKind::Blob, b"x").unwrap();
        assert!(store.exists(&oid));
    }

    #[test]
    fn copy_from_transfers_object() {
        let (_d1, src) = store();
        let (_d2, dst) = store();
        let oid = src.put(ObjectKind::Blob, b"payload").unwrap();
        assert!(!dst.exists(&oid));
        dst.copy_from(&src, &oid).unwrap();
        assert!(dst.exists(&oid));
        assert_eq!(dst.get(&oid, None).unwrap(), b"payload");
    }
}
