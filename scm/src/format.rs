//! Inline-comment and fallback-comment body formatting (§4.6).

use review_model::{Issue, Note, SuggestedFix};
use sha2::{Digest, Sha256};

use crate::types::ProviderId;

/// `issue (blocking|non-blocking), <severity>: <title>`
fn header(issue: &Issue) -> String {
    let blocking = matches!(issue.severity.to_ascii_lowercase().as_str(), "critical" | "major");
    let kind = if blocking { "blocking" } else { "non-blocking" };
    format!("issue ({kind}), {}: {}", issue.severity, issue.title)
}

fn suggestion_block(provider: ProviderId, fix: &SuggestedFix) -> String {
    match provider {
        ProviderId::GitLab => {
            let added = fix.added_lines.join("\n");
            format!("```suggestion:-{}+{}\n{}\n```", fix.removed_lines.len(), fix.added_lines.len(), added)
        }
        ProviderId::GitHub => {
            let added = fix.added_lines.join("\n");
            format!("```suggestion\n{added}\n```")
        }
    }
}

/// Builds the full visible body for an inline comment, without the
/// idempotency marker (see [`with_idempotency_marker`]).
pub fn inline_comment_body(issue: &Issue, provider: ProviderId) -> String {
    let mut body = header(issue);

    if let Some(suggestion) = &issue.suggestion {
        body.push_str("\n\n**Recommendation:** ");
        body.push_str(suggestion);
    }

    if issue.wants_suggestion_block() {
        if let Some(fix) = &issue.suggested_fix {
            body.push_str("\n\n");
            body.push_str(&suggestion_block(provider, fix));
        }
    }

    body
}

/// Appends the hidden idempotency marker to a finished comment body
/// (§4.6: `<!-- review-gateway:key=<key>;hash=<sha256(body)>;ver=1 -->`).
/// `key` is the draft's `idempotency_key` for inline comments (so a later
/// publish attempt can recognise and skip it) or the request id for the
/// one-off fallback summary comment.
pub fn with_idempotency_marker(body: &str, key: &str) -> String {
    let hash = hex_sha256(body.as_bytes());
    format!("{body}\n\n<!-- review-gateway:key={key};hash={hash};ver=1 -->")
}

pub fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// `## Additional Review Findings` fallback comment listing every invalid
/// finding with file, line, severity, and recommendation.
pub fn fallback_comment(issues: &[Issue], notes: &[Note]) -> String {
    let mut out = String::from("## Additional Review Findings\n\n");

    for issue in issues {
        out.push_str(&format!("- **{}:{}** ({}) {}", issue.file, issue.start_line, issue.severity, issue.title));
        if let Some(suggestion) = &issue.suggestion {
            out.push_str(&format!(" — _Recommendation: {suggestion}_"));
        }
        out.push('\n');
    }

    for note in notes {
        out.push_str(&format!("- **{}:{}** {}\n", note.file, note.line, note.text));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> Issue {
        Issue {
            file: "a.rs".into(),
            start_line: 3,
            severity: "critical".into(),
            title: "unchecked unwrap".into(),
            suggestion: Some("use `?`".into()),
            confidence: Some(0.9),
            suggested_fix: Some(SuggestedFix { removed_lines: vec!["x.unwrap()".into()], added_lines: vec!["x?".into()] }),
        }
    }

    #[test]
    fn blocking_header_for_critical() {
        let body = inline_comment_body(&issue(), ProviderId::GitHub);
        assert!(body.starts_with("issue (blocking), critical: unchecked unwrap"));
        assert!(body.contains("**Recommendation:** use `?`"));
        assert!(body.contains("```suggestion"));
    }

    #[test]
    fn marker_is_appended_and_hash_stable() {
        let body = inline_comment_body(&issue(), ProviderId::GitHub);
        let marked_a = with_idempotency_marker(&body, "req-1");
        let marked_b = with_idempotency_marker(&body, "req-1");
        assert_eq!(marked_a, marked_b);
        assert!(marked_a.contains("<!-- review-gateway:key=req-1;hash="));
    }

    #[test]
    fn low_confidence_issue_has_no_suggestion_block() {
        let mut i = issue();
        i.confidence = Some(0.2);
        let body = inline_comment_body(&i, ProviderId::GitHub);
        assert!(!body.contains("```suggestion"));
    }
}
