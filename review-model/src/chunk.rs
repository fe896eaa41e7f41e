use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of a review chunk's content, mirrors the typed
/// fragments an engine may emit while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkType {
    Analysis,
    Security,
    Performance,
    Suggestion,
    Commentary,
}

/// A typed fragment of model output delivered during streaming. `text` may
/// be partial JSON — only the accumulator, after seeing every chunk, can
/// parse the embedded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewChunk {
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ReviewChunk {
    pub fn new(chunk_type: ChunkType, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self { chunk_type, text: text.into(), timestamp }
    }
}
