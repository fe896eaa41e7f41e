//! Generic SCM adapter contract (§4.6) plus GitHub and GitLab
//! implementations, dispatched through an enum-based [`ScmClient`] facade.

mod client;
mod errors;
mod format;
mod github;
mod gitlab;
mod idempotency;
mod types;

pub use client::{ScmClient, ScmConfig};
pub use errors::{ScmError, ScmErrorKind, ScmResult};
pub use format::fallback_comment;
pub use types::*;

use review_model::{Issue, ReviewResult};

/// Builds one [`InlineCommentDraft`] per issue in `valid`, formatted for
/// `provider` (§4.6 inline-comment formatting).
pub fn build_inline_drafts(valid: &ReviewResult, provider: ProviderId) -> Vec<InlineCommentDraft> {
    valid
        .issues
        .iter()
        .map(|issue| InlineCommentDraft {
            location: CommentLocation { file_path: issue.file.clone(), line: issue.start_line, side: CommentSide::Right },
            body: format::inline_comment_body(issue, provider),
            idempotency_key: format!("{}:{}", issue.file, issue.start_line),
        })
        .collect()
}

/// Builds the `## Additional Review Findings` fallback body for an
/// `invalid` review result, or `None` when there is nothing to report.
pub fn build_fallback_body(invalid: &ReviewResult) -> Option<String> {
    if invalid.issues.is_empty() && invalid.notes.is_empty() {
        return None;
    }
    Some(format::fallback_comment(&invalid.issues, &invalid.notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_model::Note;

    fn issue(file: &str, line: u32) -> Issue {
        Issue { file: file.into(), start_line: line, severity: "major".into(), title: "t".into(), suggestion: None, confidence: None, suggested_fix: None }
    }

    #[test]
    fn builds_one_draft_per_issue() {
        let result = ReviewResult { summary: "s".into(), issues: vec![issue("a.rs", 1), issue("b.rs", 2)], notes: vec![], ..Default::default() };
        let drafts = build_inline_drafts(&result, ProviderId::GitHub);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].location.file_path, "a.rs");
    }

    #[test]
    fn no_fallback_when_invalid_is_empty() {
        let empty = ReviewResult::default();
        assert!(build_fallback_body(&empty).is_none());
    }

    #[test]
    fn fallback_lists_invalid_findings() {
        let invalid = ReviewResult {
            summary: "s".into(),
            issues: vec![issue("a.rs", 9)],
            notes: vec![Note { file: "a.rs".into(), line: 1, text: "note".into() }],
            ..Default::default()
        };
        let body = build_fallback_body(&invalid).unwrap();
        assert!(body.starts_with("## Additional Review Findings"));
        assert!(body.contains("a.rs:9"));
        assert!(body.contains("note"));
    }
}
