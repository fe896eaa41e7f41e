//! Folds a stream of [`ReviewChunk`]s into a structured [`ReviewResult`]:
//! JSON-object extraction from concatenated chunk text, schema validation,
//! confidence filtering, and per-file prioritisation.

mod errors;
mod extract;
mod schema;

pub use errors::AccumulatorError;

use std::collections::HashMap;

use review_model::{ChunkType, Issue, Note, ReviewChunk, ReviewResult};

/// Default minimum confidence an issue must carry to survive accumulation.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Default maximum number of issues kept per file.
pub const DEFAULT_MAX_ISSUES_PER_FILE: usize = 10;

/// Tunable accumulation parameters, normally sourced from `AppConfig`.
#[derive(Debug, Clone, Copy)]
pub struct AccumulatorConfig {
    pub confidence_threshold: f32,
    pub max_issues_per_file: usize,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_issues_per_file: DEFAULT_MAX_ISSUES_PER_FILE,
        }
    }
}

/// Concatenates `chunks`' text (in order) and folds the result into a
/// [`ReviewResult`], per §4.5. Chunks of any [`ChunkType`] contribute to the
/// same buffer; the accumulator does not special-case a chunk's type, only
/// its text content.
pub fn accumulate(chunks: &[ReviewChunk], config: AccumulatorConfig) -> Result<ReviewResult, AccumulatorError> {
    if chunks.is_empty() {
        return Err(AccumulatorError::InvalidInput);
    }

    let mut buffer = String::new();
    for chunk in chunks {
        buffer.push_str(&chunk.text);
    }

    accumulate_text(&buffer, config)
}

/// Same as [`accumulate`] but takes an already-concatenated buffer. Exposed
/// directly so callers that already hold the joined text (or want to test
/// idempotence across arbitrary character-boundary splits) don't need to
/// re-wrap it as chunks.
pub fn accumulate_text(buffer: &str, config: AccumulatorConfig) -> Result<ReviewResult, AccumulatorError> {
    if buffer.trim().is_empty() {
        return Err(AccumulatorError::InvalidInput);
    }

    let object_text = extract::extract_json_object(buffer).ok_or(AccumulatorError::NonJsonResponse)?;

    let raw: schema::RawReviewResult = serde_json::from_str(object_text)
        .map_err(|e| AccumulatorError::JsonValidationError { field: guess_offending_field(&e) })?;

    let summary = raw.summary;

    let mut issues = Vec::with_capacity(raw.issues.len());
    for raw_issue in raw.issues {
        issues.push(raw_issue.into_issue()?);
    }

    let notes: Vec<Note> = raw
        .non_blocking_notes
        .into_iter()
        .map(|n| Note { file: n.file, line: n.line, text: n.text })
        .collect();

    let issues = apply_confidence_filter(issues, config.confidence_threshold);
    let issues = apply_per_file_cap(issues, config.max_issues_per_file);

    Ok(ReviewResult { summary, issues, notes, llm_provider: None, llm_model: None, raw_llm_response: Some(buffer.to_string()) })
}

fn guess_offending_field(err: &serde_json::Error) -> String {
    let msg = err.to_string();
    for candidate in ["summary", "issues", "nonBlockingNotes", "severity", "file", "startLine", "title", "line", "text"] {
        if msg.contains(candidate) {
            return candidate.to_string();
        }
    }
    "unknown".to_string()
}

fn apply_confidence_filter(issues: Vec<Issue>, threshold: f32) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|i| i.confidence.is_none_or(|c| c >= threshold))
        .collect()
}

fn apply_per_file_cap(mut issues: Vec<Issue>, max_per_file: usize) -> Vec<Issue> {
    issues.sort_by_key(|i| i.sort_key());

    let mut kept_per_file: HashMap<String, usize> = HashMap::new();
    issues
        .into_iter()
        .filter(|issue| {
            let count = kept_per_file.entry(issue.file.clone()).or_insert(0);
            let keep = *count < max_per_file;
            if keep {
                *count += 1;
            }
            keep
        })
        .collect()
}

/// Convenience: synthesises a single [`ReviewChunk`] wrapping `text`, for
/// callers that have raw model output rather than a chunk stream.
pub fn single_chunk(text: impl Into<String>, timestamp: chrono::DateTime<chrono::Utc>) -> ReviewChunk {
    ReviewChunk::new(ChunkType::Analysis, text, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chunks_from(parts: &[&str]) -> Vec<ReviewChunk> {
        parts.iter().map(|p| single_chunk(*p, Utc::now())).collect()
    }

    const VALID_JSON: &str = r#"```json
{
  "summary": "looks mostly fine",
  "issues": [
    {"file": "a.rs", "startLine": 3, "severity": "critical", "title": "unchecked unwrap", "confidence": 0.9, "suggestedFix": {"removedLines": ["x.unwrap()"], "addedLines": ["x?"]}},
    {"file": "a.rs", "startLine": 10, "severity": "minor", "title": "naming", "confidence": 0.4}
  ],
  "nonBlockingNotes": [
    {"file": "a.rs", "line": 1, "text": "consider a doc comment"}
  ]
}
```"#;

    #[test]
    fn s6_json_parsing_scenario() {
        let result = accumulate_text(VALID_JSON, AccumulatorConfig::default()).unwrap();
        // confidence filter drops the 0.4 "minor" issue (threshold 0.5).
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn rejects_unknown_severity() {
        let text = r#"{"summary":"s","issues":[{"file":"a.rs","startLine":1,"severity":"super-critical","title":"x"}],"nonBlockingNotes":[]}"#;
        let err = accumulate_text(text, AccumulatorConfig::default()).unwrap_err();
        match err {
            AccumulatorError::JsonValidationError { field } => assert_eq!(field, "severity"),
            other => panic!("expected JsonValidationError, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = accumulate(&[], AccumulatorConfig::default()).unwrap_err();
        assert!(matches!(err, AccumulatorError::InvalidInput));
    }

    #[test]
    fn no_json_object_is_non_json_response() {
        let chunks = chunks_from(&["just some prose, no braces here"]);
        let err = accumulate(&chunks, AccumulatorConfig::default()).unwrap_err();
        assert!(matches!(err, AccumulatorError::NonJsonResponse));
    }

    #[test]
    fn idempotent_across_chunk_splits() {
        let whole = accumulate_text(VALID_JSON, AccumulatorConfig::default()).unwrap();

        let mid = VALID_JSON.len() / 2;
        let split = accumulate(&chunks_from(&[&VALID_JSON[..mid], &VALID_JSON[mid..]]), AccumulatorConfig::default()).unwrap();

        assert_eq!(whole.issues.len(), split.issues.len());
        assert_eq!(whole.notes.len(), split.notes.len());
        assert_eq!(whole.summary, split.summary);
    }

    #[test]
    fn per_file_cap_keeps_highest_priority_first() {
        let mut text = String::from(r#"{"summary":"s","issues":["#);
        for i in 0..15 {
            if i > 0 {
                text.push(',');
            }
            text.push_str(&format!(
                r#"{{"file":"a.rs","startLine":{i},"severity":"info","title":"t{i}","confidence":0.9}}"#
            ));
        }
        text.push_str(r#"],"nonBlockingNotes":[]}"#);

        let config = AccumulatorConfig { confidence_threshold: 0.0, max_issues_per_file: 10 };
        let result = accumulate_text(&text, config).unwrap();
        assert_eq!(result.issues.len(), 10);
    }
}
