use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ReviewResult;
use crate::severity::Priority;

/// Aggregated view over a [`ReviewResult`]'s issues: counts per severity
/// and per priority, a de-duplication count, an overall confidence, and
/// whether any CRITICAL or security-titled issue is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub total_issues: usize,
    pub total_notes: usize,
    pub counts_by_severity: HashMap<String, usize>,
    pub counts_by_priority: HashMap<String, usize>,
    pub duplicate_count: usize,
    pub overall_confidence: f32,
    pub has_critical_or_security: bool,
}

impl FindingsSummary {
    pub fn from_result(result: &ReviewResult) -> Self {
        let mut counts_by_severity: HashMap<String, usize> = HashMap::new();
        let mut counts_by_priority: HashMap<String, usize> = HashMap::new();
        let mut confidence_sum = 0.0f32;
        let mut confidence_n = 0usize;
        let mut has_critical_or_security = false;
        let mut seen = std::collections::HashSet::new();
        let mut duplicate_count = 0usize;

        for issue in &result.issues {
            *counts_by_severity.entry(issue.severity.to_ascii_lowercase()).or_insert(0) += 1;

            let priority = issue.priority();
            let priority_key = match priority {
                Priority::Critical => "CRITICAL",
                Priority::High => "HIGH",
                Priority::Medium => "MEDIUM",
                Priority::Low => "LOW",
            };
            *counts_by_priority.entry(priority_key.to_string()).or_insert(0) += 1;

            if let Some(c) = issue.confidence {
                confidence_sum += c;
                confidence_n += 1;
            }

            if priority == Priority::Critical || issue.is_security_titled() {
                has_critical_or_security = true;
            }

            let dedup_key = (issue.file.clone(), issue.start_line, issue.title.clone());
            if !seen.insert(dedup_key) {
                duplicate_count += 1;
            }
        }

        let overall_confidence = if confidence_n > 0 { confidence_sum / confidence_n as f32 } else { 0.0 };

        Self {
            total_issues: result.issues.len(),
            total_notes: result.notes.len(),
            counts_by_severity,
            counts_by_priority,
            duplicate_count,
            overall_confidence,
            has_critical_or_security,
        }
    }
}
