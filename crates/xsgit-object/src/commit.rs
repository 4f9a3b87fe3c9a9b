use xsgit_hash::ObjectId;

use crate::ObjectError;

/// A commit object: a tree, up to two parents, and a free-form message.
///
/// No author/committer fields — unlike real git, identity is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: Vec<u8>,
}

impl Commit {
    pub fn new(tree: ObjectId, parents: Vec<ObjectId>, message: Vec<u8>) -> Self {
        Self {
            tree,
            parents,
            message,
        }
    }

    /// Parse `tree <oid>\nparent <oid>*\n\n<message>`.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut pos = 0;

        loop {
            if pos >= content.len() {
                break;
            }
            if content[pos] == b'\n' {
                pos += 1;
                break;
            }
            let line_end = content[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(content.len());
            let line = &content[pos..line_end];

            let space = line
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidCommitHeader {
                    reason: "header line missing space".into(),
                })?;
            let key = &line[..space];
            let value = &line[space + 1..];
            let hex = std::str::from_utf8(value).map_err(|_| ObjectError::InvalidCommitHeader {
                reason: "non-UTF8 oid".into(),
            })?;

            match key {
                b"tree" => {
                    if tree.is_some() {
                        return Err(ObjectError::InvalidCommitHeader {
                            reason: "duplicate tree header".into(),
                        });
                    }
                    tree = Some(ObjectId::from_hex(hex)?);
                }
                b"parent" => {
                    parents.push(ObjectId::from_hex(hex)?);
                }
                other => {
                    return Err(ObjectError::InvalidCommitHeader {
                        reason: format!(
                            "unrecognized header key '{}'",
                            String::from_utf8_lossy(other)
                        ),
                    });
                }
            }

            pos = line_end + 1;
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let message = content[pos..].to_vec();

        Ok(Self {
            tree,
            parents,
            message,
        })
    }

    /// Serialize back to `tree <oid>\nparent <oid>*\n\n<message>`.
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');
        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        let hex = format!("{:02x}", n).repeat(20);
        ObjectId::from_hex(&hex).unwrap()
    }

    #[test]
    fn parse_root_commit() {
        let data = format!("tree {}\n\nroot\n", oid(1).to_hex());
        let commit = Commit::parse(data.as_bytes()).unwrap();
        assert!(commit.parents.is_empty());
        assert_eq!(commit.message, b"root\n");
    }

    #[test]
    fn parse_merge_commit() {
        let data = format!(
            "tree {}\nparent {}\nparent {}\n\nMerge\n",
            oid(1).to_hex(),
            oid(2).to_hex(),
            oid(3).to_hex()
        );
        let commit = Commit::parse(data.as_bytes()).unwrap();
        assert!(commit.is_merge());
        assert_eq!(commit.parents, vec![oid(2), oid(3)]);
    }

    #[test]
    fn serialize_roundtrip() {
        let original = format!("tree {}\nparent {}\n\nc1\n", oid(1).to_hex(), oid(2).to_hex());
        let commit = Commit::parse(original.as_bytes()).unwrap();
        assert_eq!(commit.serialize_content(), original.as_bytes());
    }

    #[test]
    fn missing_tree_errors() {
        assert!(Commit::parse(b"\nmsg\n").is_err());
    }

    #[test]
    fn unknown_header_errors() {
        let data = format!("tree {}\nauthor someone\n\nmsg\n", oid(1).to_hex());
        assert!(Commit::parse(data.as_bytes()).is_err());
    }

    #[test]
    fn message_with_no_trailing_newline() {
        let data = format!("tree {}\n\nno newline at end", oid(1).to_hex());
        let commit = Commit::parse(data.as_bytes()).unwrap();
        assert_eq!(commit.message, b"no newline at end");
    }
}
