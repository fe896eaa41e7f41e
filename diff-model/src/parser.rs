//! Unified-diff parser.
//!
//! Tolerant of missing hunk counts (treated as 1) and of the trailing
//! `\ No newline at end of file` marker (skipped). Splits the input on
//! `diff --git` file headers when present; falls back to treating the
//! whole input as a single file's hunks when they are absent (e.g. a
//! provider API that hands back only the hunk text for one file).

use crate::errors::ParseError;
use crate::types::{DiffDocument, DiffHunk, DiffLine, FileModification};

/// Parses unified-diff text into a [`DiffDocument`].
///
/// Fails only when a hunk header (`@@ ...`) appears before any recognisable
/// file header in a multi-file input; unknown lines inside a hunk are kept
/// as context.
pub fn parse_unified_diff(text: &str) -> Result<DiffDocument, ParseError> {
    if text.trim().is_empty() {
        return Ok(DiffDocument::default());
    }

    if text.contains("\ndiff --git ") || text.starts_with("diff --git ") {
        let mut modifications = Vec::new();
        let mut rest = text;
        if let Some(stripped) = rest.strip_prefix("diff --git ") {
            rest = stripped;
        } else if let Some(idx) = rest.find("\ndiff --git ") {
            // leading prelude before the first file header is discarded.
            rest = &rest[idx + 1 + "diff --git ".len()..];
        }

        for block in split_on_file_headers(rest) {
            modifications.push(parse_file_block(block)?);
        }
        return Ok(DiffDocument::new(modifications));
    }

    // No `diff --git` headers: treat as hunks for a single, possibly
    // path-less file (the caller already knows the path out of band).
    let (old_path, new_path) = extract_path_header(text);
    let hunks = parse_hunks(text)?;
    let modification = FileModification {
        old_path,
        new_path,
        is_new: false,
        is_deleted: false,
        is_renamed: false,
        is_binary: looks_like_binary_patch(text),
        hunks,
    };
    Ok(DiffDocument::new(vec![modification]))
}

/// Splits the tail of a `diff --git` stream into per-file chunks, each
/// still missing its own leading `diff --git ` token (already consumed).
fn split_on_file_headers(rest: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut remaining = rest;
    loop {
        match remaining.find("\ndiff --git ") {
            Some(idx) => {
                blocks.push(&remaining[..idx]);
                remaining = &remaining[idx + 1 + "diff --git ".len()..];
            }
            None => {
                blocks.push(remaining);
                break;
            }
        }
    }
    blocks
}

fn parse_file_block(block: &str) -> Result<FileModification, ParseError> {
    let is_binary = looks_like_binary_patch(block);
    let is_renamed = block.contains("\nrename from ") || block.contains("\nsimilarity index ");
    let is_new = block.contains("\nnew file mode");
    let is_deleted = block.contains("\ndeleted file mode");

    let (mut old_path, mut new_path) = extract_path_header(block);

    if old_path.is_none() {
        old_path = block
            .lines()
            .find_map(|l| l.strip_prefix("rename from "))
            .map(str::to_string);
    }
    if new_path.is_none() {
        new_path = block
            .lines()
            .find_map(|l| l.strip_prefix("rename to "))
            .map(str::to_string);
    }
    if is_deleted && new_path.is_none() {
        new_path = Some("/dev/null".to_string());
    }

    let hunks = if is_binary { Vec::new() } else { parse_hunks(block)? };

    Ok(FileModification {
        old_path,
        new_path,
        is_new,
        is_deleted,
        is_renamed,
        is_binary,
        hunks,
    })
}

/// Reads `--- a/path` / `+++ b/path` (or `/dev/null`) headers if present.
fn extract_path_header(block: &str) -> (Option<String>, Option<String>) {
    let old_path = block.lines().find_map(|l| {
        l.strip_prefix("--- ").map(|rest| strip_ab_prefix(rest.trim()))
    });
    let new_path = block.lines().find_map(|l| {
        l.strip_prefix("+++ ").map(|rest| strip_ab_prefix(rest.trim()))
    });

    let old_path = old_path.filter(|p| p != "/dev/null");
    let new_path = new_path.map(|p| if p.is_empty() { "/dev/null".to_string() } else { p });

    (old_path, new_path)
}

fn strip_ab_prefix(path: &str) -> String {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

/// Parses the `@@ ... @@` hunks inside `text`, ignoring any surrounding
/// file-header lines.
fn parse_hunks(text: &str) -> Result<Vec<DiffHunk>, ParseError> {
    let mut hunks = Vec::new();
    let mut cur: Option<(u32, u32, u32, u32, Vec<DiffLine>)> = None;
    let mut old_line = 0u32;
    let mut new_line = 0u32;
    let mut seen_file_header = false;

    for line in text.lines() {
        if line.starts_with("--- ") || line.starts_with("+++ ") || line.starts_with("diff --git ")
        {
            seen_file_header = true;
            continue;
        }

        if let Some(rest) = line.strip_prefix("@@") {
            if let Some((old_start, old_lines, new_start, new_lines, lines)) = cur.take() {
                hunks.push(DiffHunk { old_start, old_lines, new_start, new_lines, lines });
            }

            let (old_start, old_lines, new_start, new_lines) = parse_hunk_header(rest)?;
            old_line = old_start;
            new_line = new_start;
            cur = Some((old_start, old_lines, new_start, new_lines, Vec::new()));
            continue;
        }

        // `\ No newline at end of file` marker: not part of diff content.
        if line.starts_with("\\ ") {
            continue;
        }

        let Some((_, _, _, _, lines)) = cur.as_mut() else {
            if seen_file_header || text.trim_start().starts_with("@@") || !line.starts_with('@') {
                // prelude / index lines before the first hunk; skip.
                continue;
            }
            return Err(ParseError::HunkBeforeFileHeader);
        };

        if let Some(rest) = line.strip_prefix('+') {
            lines.push(DiffLine::Added { new_line, content: rest.to_string() });
            new_line += 1;
        } else if let Some(rest) = line.strip_prefix('-') {
            lines.push(DiffLine::Removed { old_line, content: rest.to_string() });
            old_line += 1;
        } else if let Some(rest) = line.strip_prefix(' ') {
            lines.push(DiffLine::Context { old_line, new_line, content: rest.to_string() });
            old_line += 1;
            new_line += 1;
        } else {
            lines.push(DiffLine::Context { old_line, new_line, content: line.to_string() });
            old_line += 1;
            new_line += 1;
        }
    }

    if let Some((old_start, old_lines, new_start, new_lines, lines)) = cur {
        hunks.push(DiffHunk { old_start, old_lines, new_start, new_lines, lines });
    }

    Ok(hunks)
}

/// Parses `-o,oc +n,nc` out of a `@@ -o,oc +n,nc @@ text` header tail.
/// A missing count (`-o` instead of `-o,oc`) is treated as 1, per §4.1.
fn parse_hunk_header(rest: &str) -> Result<(u32, u32, u32, u32), ParseError> {
    let body = rest.trim_end_matches('@').trim();
    let (left, right) = body
        .split_once('+')
        .ok_or_else(|| ParseError::InvalidHunkHeader(rest.to_string()))?;

    let left = left.trim().trim_start_matches('-');
    let right = right.trim();
    // Trailing free-text after the second range (e.g. a function signature)
    // is allowed; only the leading numeric range matters.
    let right = right.split_whitespace().next().unwrap_or(right);

    let (old_start, old_lines) = split_range(left)?;
    let (new_start, new_lines) = split_range(right)?;
    Ok((old_start, old_lines, new_start, new_lines))
}

fn split_range(s: &str) -> Result<(u32, u32), ParseError> {
    match s.split_once(',') {
        Some((a, b)) => {
            let start = a
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidHunkHeader(s.to_string()))?;
            let len = b
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidHunkHeader(s.to_string()))?;
            Ok((start, len))
        }
        None => {
            let start = s
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidHunkHeader(s.to_string()))?;
            Ok((start, 1))
        }
    }
}

/// Heuristic for binary patches: `GIT binary patch`, `Binary files ... differ`,
/// or an embedded NUL byte.
pub fn looks_like_binary_patch(s: &str) -> bool {
    s.contains("GIT binary patch")
        || s.contains("Binary files ") && s.contains(" differ")
        || s.bytes().any(|b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiffLine;

    #[test]
    fn parses_single_hunk_with_full_headers() {
        let diff = "diff --git a/file.java b/file.java\n\
--- a/file.java\n\
+++ b/file.java\n\
@@ -1,1 +10,3 @@\n\
 a\n\
+b\n\
+c\n";
        let doc = parse_unified_diff(diff).unwrap();
        assert_eq!(doc.modifications.len(), 1);
        let m = &doc.modifications[0];
        assert_eq!(m.new_path.as_deref(), Some("file.java"));
        assert_eq!(m.hunks.len(), 1);
        let hunk = &m.hunks[0];
        assert_eq!(hunk.new_start, 10);
        assert_eq!(hunk.lines.len(), 3);
        assert!(matches!(hunk.lines[1], DiffLine::Added { new_line: 11, .. }));
        assert!(matches!(hunk.lines[2], DiffLine::Added { new_line: 12, .. }));
    }

    #[test]
    fn tolerates_missing_hunk_counts() {
        let diff = "@@ -5 +5 @@\n-old\n+new\n";
        let doc = parse_unified_diff(diff).unwrap();
        let hunk = &doc.modifications[0].hunks[0];
        assert_eq!(hunk.old_lines, 1);
        assert_eq!(hunk.new_lines, 1);
    }

    #[test]
    fn skips_no_newline_marker() {
        let diff = "@@ -1,1 +1,1 @@\n-a\n+b\n\\ No newline at end of file\n";
        let doc = parse_unified_diff(diff).unwrap();
        assert_eq!(doc.modifications[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn detects_binary_deleted_file() {
        let diff = "diff --git a/img.png b/img.png\n\
deleted file mode 100644\n\
index abc123..0000000\n\
Binary files a/img.png and /dev/null differ\n";
        let doc = parse_unified_diff(diff).unwrap();
        let m = &doc.modifications[0];
        assert!(m.is_binary);
        assert!(m.is_deleted);
        assert_eq!(m.new_path.as_deref(), Some("/dev/null"));
    }

    #[test]
    fn detects_rename() {
        let diff = "diff --git a/old.rs b/new.rs\n\
similarity index 100%\n\
rename from old.rs\n\
rename to new.rs\n";
        let doc = parse_unified_diff(diff).unwrap();
        let m = &doc.modifications[0];
        assert!(m.is_renamed);
        assert_eq!(m.old_path.as_deref(), Some("old.rs"));
        assert_eq!(m.new_path.as_deref(), Some("new.rs"));
    }
}
