use serde::{Deserialize, Serialize};

use crate::severity::Priority;

/// A suggested code change attached to a high-confidence issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFix {
    /// Lines removed from the post-image, in order.
    pub removed_lines: Vec<String>,
    /// Lines added in their place, in order.
    pub added_lines: Vec<String>,
}

/// A single review finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub file: String,
    pub start_line: u32,
    /// Raw severity string as reported by the LLM, lowercase-mapped for
    /// priority purposes but kept verbatim here for display.
    pub severity: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<SuggestedFix>,
}

impl Issue {
    /// Priority bucket per the total severity→priority mapping.
    pub fn priority(&self) -> Priority {
        Priority::from_severity_str(Some(&self.severity))
    }

    /// Sort key for per-file capping: priority ordinal ascending, then
    /// confidence descending (§8 property 7). Issues with no confidence
    /// sort after those that have one, within the same priority.
    pub fn sort_key(&self) -> (u8, i32) {
        let conf_key = match self.confidence {
            Some(c) => -((c * 1_000_000.0) as i32),
            None => i32::MAX,
        };
        (self.priority().ordinal(), conf_key)
    }

    /// §4.6: an issue qualifies for a provider suggestion block when it is
    /// high-confidence (≥0.7) and carries a suggested fix.
    pub fn wants_suggestion_block(&self) -> bool {
        self.confidence.is_some_and(|c| c >= 0.7) && self.suggested_fix.is_some()
    }

    /// Loose heuristic used by [`crate::FindingsSummary`] to flag
    /// security-relevant findings regardless of severity.
    pub fn is_security_titled(&self) -> bool {
        let t = self.title.to_ascii_lowercase();
        ["security", "vulnerab", "injection", "xss", "csrf", "secret", "credential"]
            .iter()
            .any(|kw| t.contains(kw))
    }
}

/// A non-blocking observation, distinct from an [`Issue`] in that it never
/// carries severity/confidence/fix metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub file: String,
    pub line: u32,
    pub text: String,
}
