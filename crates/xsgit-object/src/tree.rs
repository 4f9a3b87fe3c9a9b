use xsgit_hash::ObjectId;

use crate::ObjectError;

/// The kind of a tree entry: a nested tree or a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, ObjectError> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            other => Err(ObjectError::InvalidTreeEntry {
                reason: format!("unknown entry kind '{other}'"),
            }),
        }
    }
}

/// One line of a tree listing: `"<kind> <oid> <name>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub oid: ObjectId,
    pub name: String,
}

impl TreeEntry {
    /// `name` must not be `.`, `..`, or contain `/` (invariant 2 of the data model).
    pub fn validate_name(name: &str) -> Result<(), ObjectError> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(ObjectError::ForbiddenEntryName(name.to_string()));
        }
        Ok(())
    }
}

/// A tree object: an ascending-by-name listing of entries, no file modes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"<kind> <oid> <name>\n"` lines. Entries are expected sorted but
    /// parsing does not itself require it — callers that re-serialize an
    /// out-of-order tree will get a different OID, which is the point.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let text = std::str::from_utf8(content)
            .map_err(|_| ObjectError::InvalidTreeEntry {
                reason: "non-UTF8 tree content".into(),
            })?;
        let mut entries = Vec::new();
        for line in text.split_terminator('\n') {
            let mut parts = line.splitn(3, ' ');
            let kind = parts
                .next()
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    reason: "missing kind".into(),
                })?;
            let oid_hex = parts
                .next()
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    reason: "missing oid".into(),
                })?;
            let name = parts
                .next()
                .ok_or_else(|| ObjectError::InvalidTreeEntry {
                    reason: "missing name".into(),
                })?;

            let kind = EntryKind::from_str(kind)?;
            let oid = ObjectId::from_hex(oid_hex)?;
            TreeEntry::validate_name(name)?;

            entries.push(TreeEntry {
                kind,
                oid,
                name: name.to_string(),
            });
        }
        Ok(Self { entries })
    }

    /// Serialize in ascending lexicographic (byte-wise) order by name.
    ///
    /// Re-serializing a parsed tree is byte-identical (invariant 3) because
    /// entries are always sorted before being written, regardless of the
    /// order they were constructed in.
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        let mut out = String::new();
        for entry in sorted {
            out.push_str(entry.kind.as_str());
            out.push(' ');
            out.push_str(&entry.oid.to_hex());
            out.push(' ');
            out.push_str(&entry.name);
            out.push('\n');
        }
        out.into_bytes()
    }

    pub fn find(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
