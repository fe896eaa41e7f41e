use serde::{Deserialize, Serialize};

/// Which wire protocol to speak underneath the streaming review engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmKind {
    Ollama,
    OpenAi,
}

impl LlmKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "ollama" => Some(LlmKind::Ollama),
            "openai" => Some(LlmKind::OpenAi),
            _ => None,
        }
    }
}

/// Connection + sampling settings for the configured LLM backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub kind: LlmKind,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

/// A single chat message in the request transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}
