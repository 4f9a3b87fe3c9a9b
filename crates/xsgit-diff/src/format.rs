//! Unified-diff text output: `---`/`+++` labels, `@@ ... @@` hunk headers,
//! and context/addition/deletion lines.
//!
//! Trimmed from a full git-style formatter: no `diff --git` preamble, mode
//! lines, or index line — just a unified diff body labelled
//! `a/<path>`/`b/<path>`.

use crate::algorithm::{DiffLine, Hunk};

/// Render hunks as a unified diff body labelled with `a_label`/`b_label`.
pub fn format_unified(a_label: &str, b_label: &str, hunks: &[Hunk]) -> Vec<u8> {
    let mut out = Vec::new();
    if hunks.is_empty() {
        return out;
    }

    out.extend_from_slice(format!("--- {a_label}\n").as_bytes());
    out.extend_from_slice(format!("+++ {b_label}\n").as_bytes());

    for hunk in hunks {
        format_hunk(&mut out, hunk);
    }

    out
}

fn format_hunk(out: &mut Vec<u8>, hunk: &Hunk) {
    let old_range = if hunk.old_count == 1 {
        format!("{}", hunk.old_start)
    } else {
        format!("{},{}", hunk.old_start, hunk.old_count)
    };
    let new_range = if hunk.new_count == 1 {
        format!("{}", hunk.new_start)
    } else {
        format!("{},{}", hunk.new_start, hunk.new_count)
    };
    out.extend_from_slice(format!("@@ -{old_range} +{new_range} @@\n").as_bytes());

    for line in &hunk.lines {
        match line {
            DiffLine::Context(content) => {
                out.push(b' ');
                push_line(out, content);
            }
            DiffLine::Addition(content) => {
                out.push(b'+');
                push_line(out, content);
            }
            DiffLine::Deletion(content) => {
                out.push(b'-');
                push_line(out, content);
            }
        }
    }
}

fn push_line(out: &mut Vec<u8>, content: &[u8]) {
    out.extend_from_slice(content);
    if !content.ends_with(b"\n") {
        out.extend_from_slice(b"\n\\ No newline at end of file\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::diff_lines;

    #[test]
    fn no_changes_produces_empty_output() {
        let hunks = diff_lines(b"a\n", b"a\n", 3);
        assert!(format_unified("a/x", "b/x", &hunks).is_empty());
    }

    #[test]
    fn labels_and_markers_present() {
        let hunks = diff_lines(b"a\nb\n", b"a\nc\n", 1);
        let out = format_unified("a/f.txt", "b/f.txt", &hunks);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("--- a/f.txt\n+++ b/f.txt\n"));
        assert!(text.contains("-b\n"));
        assert!(text.contains("+c\n"));
    }

    #[test]
    fn missing_trailing_newline_is_flagged() {
        let hunks = diff_lines(b"a\n", b"a\nb", 1);
        let out = format_unified("a/f", "b/f", &hunks);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\\ No newline at end of file"));
    }
}
