//! The review finding model: issues, notes, severity/priority mapping,
//! and the accumulated [`ReviewResult`].

mod aggregate;
mod chunk;
mod issue;
mod severity;

pub use aggregate::FindingsSummary;
pub use chunk::{ChunkType, ReviewChunk};
pub use issue::{Note, SuggestedFix};
pub use severity::{Priority, Severity};

use serde::{Deserialize, Serialize};

pub use issue::Issue;

/// Accumulated review output: one summary, an ordered issue list, and
/// non-blocking notes. Duplicates are allowed before accumulation has
/// deduplicated them; published exactly once per change request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub summary: String,
    pub issues: Vec<Issue>,
    pub notes: Vec<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<String>,
}

impl ReviewResult {
    pub fn new(summary: String, issues: Vec<Issue>, notes: Vec<Note>) -> Self {
        Self { summary, issues, notes, llm_provider: None, llm_model: None, raw_llm_response: None }
    }

    /// All issues touching `file`.
    pub fn issues_in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.file == file)
    }

    /// Summarised counts and flags over the current issue set.
    pub fn summarize(&self) -> FindingsSummary {
        FindingsSummary::from_result(self)
    }
}
