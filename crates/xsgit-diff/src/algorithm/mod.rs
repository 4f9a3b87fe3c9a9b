//! Line-level diff: edit scripts and hunk assembly.

pub mod myers;

const DEFAULT_CONTEXT_LINES: u32 = 3;

/// An edit operation in the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Equal,
    Insert,
    Delete,
}

/// A single edit in the edit script, referencing lines by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub op: EditOp,
    pub old_index: usize,
    pub new_index: usize,
}

/// One line of hunk content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(Vec<u8>),
    Addition(Vec<u8>),
    Deletion(Vec<u8>),
}

/// A contiguous block of changed lines plus surrounding context, in the
/// shape a unified-diff formatter expects.
#[derive(Debug, Clone)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

/// Diff two byte slices line by line.
pub fn diff_edits(old: &[u8], new: &[u8]) -> Vec<Edit> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    myers::diff(&old_lines, &new_lines)
}

/// Diff two byte slices and assemble unified-diff-style hunks with
/// `context_lines` lines of context on each side of a change.
pub fn diff_lines(old: &[u8], new: &[u8], context_lines: u32) -> Vec<Hunk> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let edits = myers::diff(&old_lines, &new_lines);
    edits_to_hunks(&edits, &old_lines, &new_lines, context_lines)
}

/// Same as [`diff_lines`] with the conventional 3 lines of context.
pub fn diff_lines_default(old: &[u8], new: &[u8]) -> Vec<Hunk> {
    diff_lines(old, new, DEFAULT_CONTEXT_LINES)
}

fn edits_to_hunks(
    edits: &[Edit],
    old_lines: &[&[u8]],
    new_lines: &[&[u8]],
    context_lines: u32,
) -> Vec<Hunk> {
    if edits.is_empty() {
        return Vec::new();
    }

    let ctx = context_lines as usize;

    let mut change_ranges: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < edits.len() {
        if edits[i].op != EditOp::Equal {
            let start = i;
            while i < edits.len() && edits[i].op != EditOp::Equal {
                i += 1;
            }
            change_ranges.push((start, i));
        } else {
            i += 1;
        }
    }
    if change_ranges.is_empty() {
        return Vec::new();
    }

    let mut merged_ranges: Vec<(usize, usize)> = Vec::new();
    let mut current = change_ranges[0];
    for &(start, end) in &change_ranges[1..] {
        let gap = start - current.1;
        if gap <= 2 * ctx {
            current.1 = end;
        } else {
            merged_ranges.push(current);
            current = (start, end);
        }
    }
    merged_ranges.push(current);

    let mut hunks = Vec::new();
    for (change_start, change_end) in merged_ranges {
        let mut lines = Vec::new();

        let ctx_before_start = change_start.saturating_sub(ctx);
        let mut old_start = edits[change_start].old_index;
        let mut new_start = edits[change_start].new_index;

        for j in ctx_before_start..change_start {
            if edits[j].op == EditOp::Equal {
                lines.push(DiffLine::Context(old_lines[edits[j].old_index].to_vec()));
                old_start = old_start.min(edits[j].old_index);
                new_start = new_start.min(edits[j].new_index);
            }
        }
        if !lines.is_empty() {
            old_start = edits[ctx_before_start].old_index;
            new_start = edits[ctx_before_start].new_index;
        }

        let mut old_count = lines.len() as u32;
        let mut new_count = lines.len() as u32;
        for j in change_start..change_end {
            match edits[j].op {
                EditOp::Equal => {
                    lines.push(DiffLine::Context(old_lines[edits[j].old_index].to_vec()));
                    old_count += 1;
                    new_count += 1;
                }
                EditOp::Delete => {
                    lines.push(DiffLine::Deletion(old_lines[edits[j].old_index].to_vec()));
                    old_count += 1;
                }
                EditOp::Insert => {
                    lines.push(DiffLine::Addition(new_lines[edits[j].new_index].to_vec()));
                    new_count += 1;
                }
            }
        }

        let ctx_after_end = (change_end + ctx).min(edits.len());
        for j in change_end..ctx_after_end {
            if edits[j].op == EditOp::Equal {
                lines.push(DiffLine::Context(old_lines[edits[j].old_index].to_vec()));
                old_count += 1;
                new_count += 1;
            }
        }

        hunks.push(Hunk {
            old_start: (old_start + 1) as u32,
            old_count,
            new_start: (new_start + 1) as u32,
            new_count,
            lines,
        });
    }

    hunks
}

/// Split a byte slice into lines, each keeping its trailing `\n` if present.
pub fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &byte) in data.iter().enumerate() {
        if byte == b'\n' {
            lines.push(&data[start..=i]);
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// DJB2a hash, used to cheapen line comparison in the Myers inner loop.
pub(crate) fn line_hash(line: &[u8]) -> u64 {
    let mut hash: u64 = 5381;
    for &b in line {
        hash = hash.wrapping_mul(33) ^ (b as u64);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_no_trailing_newline() {
        let lines = split_lines(b"a\nb");
        assert_eq!(lines, vec![b"a\n".as_slice(), b"b"]);
    }

    #[test]
    fn split_lines_empty() {
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn diff_lines_single_hunk_with_context() {
        let old = b"a\nb\nc\nd\ne\n";
        let new = b"a\nb\nX\nd\ne\n";
        let hunks = diff_lines(old, new, 1);
        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 2);
        assert_eq!(hunk.new_start, 2);
    }

    #[test]
    fn identical_content_has_no_hunks() {
        assert!(diff_lines(b"a\nb\n", b"a\nb\n", 3).is_empty());
    }
}
