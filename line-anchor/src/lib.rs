//! Line validator and comment-placement router.
//!
//! Decides, for each [`Issue`]/[`Note`] in a [`ReviewResult`], whether its
//! `(file, line)` pair anchors to an added or context line in a diff's
//! post-image, then partitions the result into findings that can be
//! placed inline and findings that must fall back to a summary comment.

use diff_model::{DiffDocument, DiffLine};
use review_model::{Note, ReviewResult};

/// `valid` and `invalid` are two views over the same underlying issues and
/// notes, partitioned — every finding appears in exactly one (§8 router
/// law: `valid ⊎ invalid = input`).
#[derive(Debug, Clone, Default)]
pub struct SplitResult {
    pub valid: ReviewResult,
    pub invalid: ReviewResult,
}

/// Line-validator law (§8 property 3): `valid` holds iff there is a file
/// modification whose `new_path` equals `file` and `line` falls on a `+`
/// or ` ` line within one of its hunks.
pub fn is_valid_anchor(doc: &DiffDocument, file: &str, line: u32) -> bool {
    let Some(modification) = doc.find_by_new_path(file) else {
        return false;
    };

    modification.hunks.iter().any(|hunk| {
        hunk.lines.iter().any(|l| match l {
            DiffLine::Added { new_line, .. } | DiffLine::Context { new_line, .. } => {
                *new_line == line
            }
            DiffLine::Removed { .. } => false,
        })
    })
}

/// Splits every issue and note in `result` into valid (inline-placeable)
/// and invalid (fallback-only) views. Never fails — an invalid finding is
/// routed, not rejected (§4.3 failure semantics).
pub fn route(doc: &DiffDocument, result: &ReviewResult) -> SplitResult {
    let mut out = SplitResult {
        valid: ReviewResult {
            summary: result.summary.clone(),
            llm_provider: result.llm_provider.clone(),
            llm_model: result.llm_model.clone(),
            raw_llm_response: result.raw_llm_response.clone(),
            ..Default::default()
        },
        invalid: ReviewResult {
            summary: result.summary.clone(),
            ..Default::default()
        },
    };

    for issue in &result.issues {
        if is_valid_anchor(doc, &issue.file, issue.start_line) {
            out.valid.issues.push(issue.clone());
        } else {
            out.invalid.issues.push(issue.clone());
        }
    }

    for note in &result.notes {
        if is_valid_anchor(doc, &note.file, note.line) {
            out.valid.notes.push(note.clone());
        } else {
            out.invalid.notes.push(note.clone());
        }
    }

    out
}

/// Convenience used by callers that only need to test a single note-shaped
/// location without building a full [`ReviewResult`].
pub fn is_valid_note_anchor(doc: &DiffDocument, note: &Note) -> bool {
    is_valid_anchor(doc, &note.file, note.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diff_model::parse_unified_diff;
    use review_model::Issue;

    fn sample_doc() -> DiffDocument {
        let diff = "diff --git a/file.java b/file.java\n\
--- a/file.java\n\
+++ b/file.java\n\
@@ -1,1 +10,3 @@\n\
 a\n\
+b\n\
+c\n";
        parse_unified_diff(diff).unwrap()
    }

    fn issue_at(file: &str, line: u32) -> Issue {
        Issue {
            file: file.to_string(),
            start_line: line,
            severity: "major".into(),
            title: "t".into(),
            suggestion: None,
            confidence: None,
            suggested_fix: None,
        }
    }

    #[test]
    fn s5_inline_placement_scenario() {
        let doc = sample_doc();
        assert!(is_valid_anchor(&doc, "file.java", 11));
        assert!(!is_valid_anchor(&doc, "file.java", 9));
    }

    #[test]
    fn router_partitions_without_duplication() {
        let doc = sample_doc();
        let result = ReviewResult {
            summary: "s".into(),
            issues: vec![issue_at("file.java", 11), issue_at("file.java", 9)],
            notes: vec![],
            ..Default::default()
        };
        let split = route(&doc, &result);
        assert_eq!(split.valid.issues.len(), 1);
        assert_eq!(split.invalid.issues.len(), 1);
        assert_eq!(split.valid.issues[0].start_line, 11);
        assert_eq!(split.invalid.issues[0].start_line, 9);
    }

    #[test]
    fn unknown_file_is_always_invalid() {
        let doc = sample_doc();
        assert!(!is_valid_anchor(&doc, "other.java", 10));
    }
}
