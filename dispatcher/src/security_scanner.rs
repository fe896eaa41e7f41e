//! The AGENTIC pipeline's static-analysis/security-scan merge point is an
//! out-of-scope external collaborator; this port exists and is wired so a
//! real scanner can be substituted without touching the dispatcher, but no
//! scanner logic is specified or implemented here (§4.8).

use review_model::{Issue, Note};
use scm::DiffBundle;

#[derive(Debug, Clone, Default)]
pub struct ScanFindings {
    pub issues: Vec<Issue>,
    pub notes: Vec<Note>,
}

pub trait SecurityScanner: Send + Sync {
    fn scan(&self, diff: &DiffBundle) -> ScanFindings;
}

/// The only implementation wired today: always returns an empty finding set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSecurityScanner;

impl SecurityScanner for NoopSecurityScanner {
    fn scan(&self, _diff: &DiffBundle) -> ScanFindings {
        ScanFindings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_scanner_returns_nothing() {
        let scanner = NoopSecurityScanner;
        let diff = crate::test_support::empty_diff_bundle();
        let findings = scanner.scan(&diff);
        assert!(findings.issues.is_empty());
        assert!(findings.notes.is_empty());
    }
}
