//! Wire types the ingress, stores, and workers all share (§3, §4.7, §4.8).

use chrono::{DateTime, Utc};
use scm::ProviderId;
use serde::{Deserialize, Serialize};

/// DIFF (lightweight, diff-only) vs. AGENTIC (checkout + static analysis +
/// security scans). Selects which named stream a request lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewMode {
    Diff,
    Agentic,
}

impl ReviewMode {
    /// Coerces a free-form string case-insensitively; unknown values fall
    /// back to `Diff` rather than rejecting the request (§4.7).
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("agentic") => ReviewMode::Agentic,
            _ => ReviewMode::Diff,
        }
    }
}

/// A job submitted to the dispatcher, whatever its ingress route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncRequest {
    pub request_id: String,
    pub provider: ProviderId,
    pub repository_id: String,
    pub change_request_id: u64,
    pub mode: ReviewMode,
    pub trigger_source: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl AsyncRequest {
    pub fn new(provider: ProviderId, repository_id: impl Into<String>, change_request_id: u64, mode: ReviewMode, trigger_source: Option<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            provider,
            repository_id: repository_id.into(),
            change_request_id,
            mode,
            trigger_source,
            submitted_at: Utc::now(),
        }
    }
}

/// Per-request lifecycle state; never transitions out of a terminal state
/// (§8 property 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A status-store entry, keyed by `requestId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<review_model::ReviewResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl StatusEntry {
    pub fn pending() -> Self {
        Self { status: RequestStatus::Pending, result: None, error: None, processing_time_ms: None }
    }

    pub fn processing() -> Self {
        Self { status: RequestStatus::Processing, result: None, error: None, processing_time_ms: None }
    }

    pub fn completed(result: review_model::ReviewResult, processing_time_ms: u64) -> Self {
        Self { status: RequestStatus::Completed, result: Some(result), error: None, processing_time_ms: Some(processing_time_ms) }
    }

    pub fn failed(error: impl Into<String>, processing_time_ms: u64) -> Self {
        Self { status: RequestStatus::Failed, result: None, error: Some(error.into()), processing_time_ms: Some(processing_time_ms) }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RequestStatus::Completed | RequestStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_coerce_is_case_insensitive() {
        assert_eq!(ReviewMode::coerce(Some("AGENTIC")), ReviewMode::Agentic);
        assert_eq!(ReviewMode::coerce(Some("agentic")), ReviewMode::Agentic);
    }

    #[test]
    fn unknown_mode_falls_back_to_diff() {
        assert_eq!(ReviewMode::coerce(Some("bogus")), ReviewMode::Diff);
        assert_eq!(ReviewMode::coerce(None), ReviewMode::Diff);
    }

    #[test]
    fn terminal_states_are_completed_and_failed_only() {
        assert!(StatusEntry::completed(review_model::ReviewResult::default(), 1).is_terminal());
        assert!(StatusEntry::failed("boom", 1).is_terminal());
        assert!(!StatusEntry::pending().is_terminal());
        assert!(!StatusEntry::processing().is_terminal());
    }
}
