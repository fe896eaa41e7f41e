use serde::Deserialize;

use review_model::{Issue, Severity, SuggestedFix};

use crate::errors::AccumulatorError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewResult {
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
    #[serde(default)]
    pub non_blocking_notes: Vec<RawNote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub file: String,
    pub start_line: u32,
    pub severity: String,
    pub title: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub suggested_fix: Option<SuggestedFix>,
}

impl RawIssue {
    /// Validates `severity` against the recognised set before constructing
    /// the domain [`Issue`] (§4.5 step 3: schema validation names the
    /// offending field).
    pub fn into_issue(self) -> Result<Issue, AccumulatorError> {
        if Severity::parse(&self.severity).is_none() {
            return Err(AccumulatorError::JsonValidationError { field: "severity".to_string() });
        }

        Ok(Issue {
            file: self.file,
            start_line: self.start_line,
            severity: self.severity,
            title: self.title,
            suggestion: self.suggestion,
            confidence: self.confidence,
            suggested_fix: self.suggested_fix,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNote {
    pub file: String,
    pub line: u32,
    pub text: String,
}
