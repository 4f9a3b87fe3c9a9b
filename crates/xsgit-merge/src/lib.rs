//! The `TextMerge3` operator and tree-level three-way merge.
//!
//! Diffs base→ours and base→theirs, interleaves the non-overlapping
//! change regions, and emits `<<<<<<<`/`=======`/`>>>>>>>` conflict
//! markers (no `|||||||` base section) where the two sides touch the
//! same lines. A side missing a file entirely is treated as empty
//! content, the same convention `xsgit-diff`'s `TextDiff` uses.

use std::collections::BTreeMap;

use xsgit_diff::algorithm::{diff_edits, split_lines, Edit, EditOp};
use xsgit_hash::ObjectId;
use xsgit_object::ObjectKind;
use xsgit_odb::{ObjectStore, OdbError};

/// Errors produced by merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error(transparent)]
    Odb(#[from] OdbError),
}

/// Labels used in conflict markers.
#[derive(Debug, Clone, Copy)]
pub struct MergeLabels<'a> {
    pub ours: &'a str,
    pub theirs: &'a str,
}

impl<'a> Default for MergeLabels<'a> {
    fn default() -> Self {
        Self {
            ours: "ours",
            theirs: "theirs",
        }
    }
}

/// The result of a three-way content merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMergeResult {
    Clean(Vec<u8>),
    Conflict { content: Vec<u8>, conflict_count: usize },
}

impl ContentMergeResult {
    pub fn is_clean(&self) -> bool {
        matches!(self, ContentMergeResult::Clean(_))
    }

    pub fn content(&self) -> &[u8] {
        match self {
            ContentMergeResult::Clean(c) => c,
            ContentMergeResult::Conflict { content, .. } => content,
        }
    }
}

/// Perform a three-way content merge of `base`, `ours`, and `theirs`.
pub fn merge_content(
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    labels: &MergeLabels<'_>,
) -> ContentMergeResult {
    if ours == theirs {
        return ContentMergeResult::Clean(ours.to_vec());
    }
    if base == ours {
        return ContentMergeResult::Clean(theirs.to_vec());
    }
    if base == theirs {
        return ContentMergeResult::Clean(ours.to_vec());
    }

    let base_lines = split_lines(base);
    let ours_lines = split_lines(ours);
    let theirs_lines = split_lines(theirs);

    let edits_ours = diff_edits(base, ours);
    let edits_theirs = diff_edits(base, theirs);

    let hunks_ours = collect_change_regions(&edits_ours);
    let hunks_theirs = collect_change_regions(&edits_theirs);

    merge_regions(
        &base_lines,
        &ours_lines,
        &theirs_lines,
        &hunks_ours,
        &hunks_theirs,
        labels,
    )
}

/// A contiguous region of changes relative to the base.
#[derive(Debug, Clone)]
struct ChangeRegion {
    base_start: usize,
    base_len: usize,
    new_start: usize,
    new_len: usize,
}

fn collect_change_regions(edits: &[Edit]) -> Vec<ChangeRegion> {
    let mut regions = Vec::new();
    let mut i = 0;

    while i < edits.len() {
        if edits[i].op == EditOp::Equal {
            i += 1;
            continue;
        }

        let base_start = edits[i].old_index;
        let new_start = edits[i].new_index;
        let mut base_end = base_start;
        let mut new_end = new_start;

        while i < edits.len() && edits[i].op != EditOp::Equal {
            match edits[i].op {
                EditOp::Delete => base_end = edits[i].old_index + 1,
                EditOp::Insert => new_end = edits[i].new_index + 1,
                EditOp::Equal => unreachable!(),
            }
            i += 1;
        }

        regions.push(ChangeRegion {
            base_start,
            base_len: base_end - base_start,
            new_start,
            new_len: new_end - new_start,
        });
    }

    regions
}

fn merge_regions(
    base_lines: &[&[u8]],
    ours_lines: &[&[u8]],
    theirs_lines: &[&[u8]],
    hunks_ours: &[ChangeRegion],
    hunks_theirs: &[ChangeRegion],
    labels: &MergeLabels<'_>,
) -> ContentMergeResult {
    let mut output: Vec<u8> = Vec::new();
    let mut conflict_count = 0;

    let mut base_pos = 0;
    let mut oi = 0;
    let mut ti = 0;

    while oi < hunks_ours.len() || ti < hunks_theirs.len() {
        let o_region = hunks_ours.get(oi);
        let t_region = hunks_theirs.get(ti);

        match (o_region, t_region) {
            (Some(o), Some(t)) => {
                let o_end = o.base_start + o.base_len;
                let t_end = t.base_start + t.base_len;

                if o_end < t.base_start || (o_end == t.base_start && o.base_start < t.base_start) {
                    emit_base_lines(&mut output, base_lines, base_pos, o.base_start);
                    emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                    base_pos = o_end;
                    oi += 1;
                } else if t_end < o.base_start || (t_end == o.base_start && t.base_start < o.base_start)
                {
                    emit_base_lines(&mut output, base_lines, base_pos, t.base_start);
                    emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                    base_pos = t_end;
                    ti += 1;
                } else {
                    let ours_content = collect_lines(ours_lines, o.new_start, o.new_len);
                    let theirs_content = collect_lines(theirs_lines, t.new_start, t.new_len);

                    let overlap_base_start = o.base_start.min(t.base_start);
                    let overlap_base_end = o_end.max(t_end);

                    emit_base_lines(&mut output, base_lines, base_pos, overlap_base_start);

                    if ours_content == theirs_content {
                        output.extend_from_slice(&ours_content);
                    } else {
                        conflict_count += 1;
                        emit_conflict(&mut output, &ours_content, &theirs_content, labels);
                    }

                    base_pos = overlap_base_end;
                    oi += 1;
                    ti += 1;
                }
            }
            (Some(o), None) => {
                let o_end = o.base_start + o.base_len;
                emit_base_lines(&mut output, base_lines, base_pos, o.base_start);
                emit_lines(&mut output, ours_lines, o.new_start, o.new_len);
                base_pos = o_end;
                oi += 1;
            }
            (None, Some(t)) => {
                let t_end = t.base_start + t.base_len;
                emit_base_lines(&mut output, base_lines, base_pos, t.base_start);
                emit_lines(&mut output, theirs_lines, t.new_start, t.new_len);
                base_pos = t_end;
                ti += 1;
            }
            (None, None) => unreachable!(),
        }
    }

    emit_base_lines(&mut output, base_lines, base_pos, base_lines.len());

    if conflict_count > 0 {
        ContentMergeResult::Conflict {
            content: output,
            conflict_count,
        }
    } else {
        ContentMergeResult::Clean(output)
    }
}

fn emit_base_lines(output: &mut Vec<u8>, base_lines: &[&[u8]], from: usize, to: usize) {
    for line in base_lines.iter().take(to).skip(from) {
        output.extend_from_slice(line);
        output.push(b'\n');
    }
}

fn emit_lines(output: &mut Vec<u8>, lines: &[&[u8]], start: usize, count: usize) {
    for i in start..start + count {
        if i < lines.len() {
            output.extend_from_slice(lines[i]);
            output.push(b'\n');
        }
    }
}

fn collect_lines(lines: &[&[u8]], start: usize, count: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in start..start + count {
        if i < lines.len() {
            buf.extend_from_slice(lines[i]);
            buf.push(b'\n');
        }
    }
    buf
}

fn emit_conflict(output: &mut Vec<u8>, ours_content: &[u8], theirs_content: &[u8], labels: &MergeLabels<'_>) {
    output.extend_from_slice(b"<<<<<<< ");
    output.extend_from_slice(labels.ours.as_bytes());
    output.push(b'\n');
    output.extend_from_slice(ours_content);
    output.extend_from_slice(b"=======\n");
    output.extend_from_slice(theirs_content);
    output.extend_from_slice(b">>>>>>> ");
    output.extend_from_slice(labels.theirs.as_bytes());
    output.push(b'\n');
}

/// The `TextMerge3` operator over stored blobs: fetches each side's bytes
/// (empty when the OID is absent) and merges them.
pub fn merge_blobs(
    odb: &ObjectStore,
    base_oid: Option<ObjectId>,
    ours_oid: Option<ObjectId>,
    theirs_oid: Option<ObjectId>,
    labels: &MergeLabels<'_>,
) -> Result<ContentMergeResult, MergeError> {
    let base = fetch_or_empty(odb, base_oid)?;
    let ours = fetch_or_empty(odb, ours_oid)?;
    let theirs = fetch_or_empty(odb, theirs_oid)?;
    Ok(merge_content(&base, &ours, &theirs, labels))
}

fn fetch_or_empty(odb: &ObjectStore, oid: Option<ObjectId>) -> Result<Vec<u8>, OdbError> {
    match oid {
        Some(oid) => odb.get_blob(&oid),
        None => Ok(Vec::new()),
    }
}

/// Result of a tree-level three-way merge: the merged `path -> oid` map,
/// plus the paths where a conflict was embedded as markers.
#[derive(Debug, Clone)]
pub struct MergeTreeResult {
    pub entries: BTreeMap<String, ObjectId>,
    pub conflicts: Vec<String>,
}

/// Three-way-merge two flat `path -> oid` maps against their common base.
///
/// For each path: if both sides agree, or only one side changed it
/// relative to base, resolve without touching content. Otherwise run
/// `TextMerge3`; clean and conflicted results alike are hashed and stored
/// (conflict resolution is left to the user at the next commit).
pub fn merge_trees(
    odb: &ObjectStore,
    base: &BTreeMap<String, ObjectId>,
    ours: &BTreeMap<String, ObjectId>,
    theirs: &BTreeMap<String, ObjectId>,
    labels: &MergeLabels<'_>,
) -> Result<MergeTreeResult, MergeError> {
    let rows = xsgit_diff::compare_trees(&[base, ours, theirs]);
    let mut entries = BTreeMap::new();
    let mut conflicts = Vec::new();

    for (path, oids) in rows {
        let base_oid = oids[0];
        let ours_oid = oids[1];
        let theirs_oid = oids[2];

        if ours_oid == theirs_oid {
            if let Some(oid) = ours_oid {
                entries.insert(path, oid);
            }
            continue;
        }
        if base_oid == ours_oid {
            if let Some(oid) = theirs_oid {
                entries.insert(path, oid);
            }
            continue;
        }
        if base_oid == theirs_oid {
            if let Some(oid) = ours_oid {
                entries.insert(path, oid);
            }
            continue;
        }

        let result = merge_blobs(odb, base_oid, ours_oid, theirs_oid, labels)?;
        let merged_oid = odb.put(ObjectKind::Blob, result.content())?;
        entries.insert(path.clone(), merged_oid);
        if !result.is_clean() {
            conflicts.push(path);
        }
    }

    Ok(MergeTreeResult { entries, conflicts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> MergeLabels<'static> {
        MergeLabels {
            ours: "HEAD",
            theirs: "feature",
        }
    }

    #[test]
    fn non_overlapping_changes_merge_cleanly() {
        let base = b"line1\nline2\nline3\nline4\n";
        let ours = b"modified1\nline2\nline3\nline4\n";
        let theirs = b"line1\nline2\nline3\nmodified4\n";
        let result = merge_content(base, ours, theirs, &labels());
        assert!(result.is_clean());
        let content = String::from_utf8_lossy(result.content());
        assert!(content.contains("modified1"));
        assert!(content.contains("modified4"));
    }

    #[test]
    fn overlapping_changes_conflict() {
        let base = b"A\nB\nC\n";
        let ours = b"A1\nB\nC\n";
        let theirs = b"A2\nB\nC\n";
        let result = merge_content(base, ours, theirs, &labels());
        assert!(!result.is_clean());
        let content = String::from_utf8_lossy(result.content());
        assert!(content.starts_with("<<<<<<< HEAD\nA1\n=======\nA2\n>>>>>>> feature\n"));
    }

    #[test]
    fn identical_changes_are_clean() {
        let base = b"line1\noriginal\nline3\n";
        let ours = b"line1\nsame\nline3\n";
        let theirs = b"line1\nsame\nline3\n";
        let result = merge_content(base, ours, theirs, &labels());
        assert!(result.is_clean());
    }

    #[test]
    fn add_add_conflict_when_base_empty() {
        let result = merge_content(b"", b"ours line\n", b"theirs line\n", &labels());
        assert!(!result.is_clean());
    }

    fn store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let odb = ObjectStore::new(dir.path().join("objects"));
        odb.init().unwrap();
        (dir, odb)
    }

    #[test]
    fn merge_trees_resolves_non_conflicting_paths() {
        let (_d, odb) = store();
        let shared = odb.put(ObjectKind::Blob, b"shared\n").unwrap();
        let only_ours = odb.put(ObjectKind::Blob, b"ours change\n").unwrap();

        let mut base = BTreeMap::new();
        base.insert("a.txt".to_string(), shared);
        base.insert("b.txt".to_string(), shared);

        let mut ours = BTreeMap::new();
        ours.insert("a.txt".to_string(), only_ours);
        ours.insert("b.txt".to_string(), shared);

        let theirs = base.clone();

        let result = merge_trees(&odb, &base, &ours, &theirs, &labels()).unwrap();
        assert!(result.conflicts.is_empty());
        assert_eq!(result.entries.get("a.txt"), Some(&only_ours));
    }

    #[test]
    fn merge_trees_flags_overlapping_blob_conflict() {
        let (_d, odb) = store();
        let base_blob = odb.put(ObjectKind::Blob, b"A\nB\nC\n").unwrap();
        let ours_blob = odb.put(ObjectKind::Blob, b"A1\nB\nC\n").unwrap();
        let theirs_blob = odb.put(ObjectKind::Blob, b"A2\nB\nC\n").unwrap();

        let mut base = BTreeMap::new();
        base.insert("x".to_string(), base_blob);
        let mut ours = BTreeMap::new();
        ours.insert("x".to_string(), ours_blob);
        let mut theirs = BTreeMap::new();
        theirs.insert("x".to_string(), theirs_blob);

        let result = merge_trees(&odb, &base, &ours, &theirs, &labels()).unwrap();
        assert_eq!(result.conflicts, vec!["x".to_string()]);
        assert!(result.entries.contains_key("x"));
    }
}
