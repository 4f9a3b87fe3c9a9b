//! The three object kinds (blob, tree, commit), their framing, and codecs.

mod commit;
mod tree;

pub use commit::Commit;
pub use tree::{EntryKind, Tree, TreeEntry};

use xsgit_hash::{HashError, ObjectId};

/// Errors produced by object parsing and serialization.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object kind: {0}")]
    InvalidKind(String),

    #[error("invalid tree entry: {reason}")]
    InvalidTreeEntry { reason: String },

    #[error("forbidden tree entry name: '{0}'")]
    ForbiddenEntryName(String),

    #[error("invalid commit header: {reason}")]
    InvalidCommitHeader { reason: String },

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The three object kinds named in the data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, ObjectError> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            other => Err(ObjectError::InvalidKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed object: one of the three kinds, with its content decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Decode `payload` given its kind tag (the caller already split the
    /// framed record at the first NUL and checked the kind).
    pub fn parse_content(kind: ObjectKind, payload: &[u8]) -> Result<Self, ObjectError> {
        match kind {
            ObjectKind::Blob => Ok(Self::Blob(payload.to_vec())),
            ObjectKind::Tree => Ok(Self::Tree(Tree::parse(payload)?)),
            ObjectKind::Commit => Ok(Self::Commit(Commit::parse(payload)?)),
        }
    }

    /// The payload bytes, not yet framed with a kind tag.
    pub fn serialize_content(&self) -> Vec<u8> {
        match self {
            Self::Blob(data) => data.clone(),
            Self::Tree(tree) => tree.serialize_content(),
            Self::Commit(commit) => commit.serialize_content(),
        }
    }

    /// Compute this object's OID without writing it anywhere.
    pub fn compute_oid(&self) -> ObjectId {
        ObjectId::hash_framed(self.kind().as_str(), &self.serialize_content())
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Self::Commit(commit) => Some(commit),
            _ => None,
        }
    }
}
