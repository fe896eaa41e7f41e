use serde::{Deserialize, Serialize};

/// Severity strings recognised from LLM output, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Blocker,
    Error,
    High,
    Warning,
    Medium,
    Info,
    Low,
    Suggestion,
    Major,
    Minor,
}

impl Severity {
    /// Parses a free-form severity string, case-insensitively. Unknown or
    /// absent input maps to `None` rather than failing here — callers that
    /// must reject unknown severities (the accumulator) do so explicitly
    /// against the recognised-set list, not via this parser.
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw.to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "blocker" => Severity::Blocker,
            "error" => Severity::Error,
            "high" => Severity::High,
            "warning" => Severity::Warning,
            "medium" => Severity::Medium,
            "info" => Severity::Info,
            "low" => Severity::Low,
            "suggestion" => Severity::Suggestion,
            "major" => Severity::Major,
            "minor" => Severity::Minor,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Blocker => "blocker",
            Severity::Error => "error",
            Severity::High => "high",
            Severity::Warning => "warning",
            Severity::Medium => "medium",
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Suggestion => "suggestion",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }

    /// Is this severity considered "blocking" for inline-comment formatting
    /// (§4.6: blocking when severity ∈ {critical, major})?
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::Major)
    }
}

/// The four priority buckets findings are sorted and capped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    /// Total mapping from a raw (possibly unknown, possibly absent)
    /// severity string to exactly one priority bucket (§8 property 6).
    ///
    /// {critical, blocker} → CRITICAL; {error, high} → HIGH;
    /// {warning, medium, null/unknown} → MEDIUM; {info, low, suggestion} → LOW.
    pub fn from_severity_str(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return Priority::Medium };
        match raw.to_ascii_lowercase().as_str() {
            "critical" | "blocker" => Priority::Critical,
            "error" | "high" => Priority::High,
            "warning" | "medium" => Priority::Medium,
            "info" | "low" | "suggestion" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_mapping_is_total() {
        let inputs = [
            Some("critical"), Some("CRITICAL"), Some("blocker"),
            Some("error"), Some("high"),
            Some("warning"), Some("medium"),
            Some("info"), Some("low"), Some("suggestion"),
            Some("super-critical"), Some(""), None,
        ];
        for raw in inputs {
            // Must not panic and must land in one of the four buckets —
            // trivially true for an enum return, the real assertion is the
            // specific mappings below.
            let _ = Priority::from_severity_str(raw);
        }
        assert_eq!(Priority::from_severity_str(Some("critical")), Priority::Critical);
        assert_eq!(Priority::from_severity_str(Some("Blocker")), Priority::Critical);
        assert_eq!(Priority::from_severity_str(Some("High")), Priority::High);
        assert_eq!(Priority::from_severity_str(Some("error")), Priority::High);
        assert_eq!(Priority::from_severity_str(Some("warning")), Priority::Medium);
        assert_eq!(Priority::from_severity_str(None), Priority::Medium);
        assert_eq!(Priority::from_severity_str(Some("unknown-thing")), Priority::Medium);
        assert_eq!(Priority::from_severity_str(Some("info")), Priority::Low);
        assert_eq!(Priority::from_severity_str(Some("suggestion")), Priority::Low);
    }
}
