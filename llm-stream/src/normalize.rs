//! The engine-facing frame shape both backends are normalised into
//! (§4.4/§4.9): `{choices: [{delta: {content}, finish_reason}]}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedChoice {
    #[serde(default)]
    pub delta: NormalizedDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedFrame {
    #[serde(default)]
    pub choices: Vec<NormalizedChoice>,
}

impl NormalizedFrame {
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref()).filter(|s| !s.is_empty())
    }

    pub fn is_finished(&self) -> bool {
        self.choices.first().is_some_and(|c| c.finish_reason.is_some())
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self { choices: vec![NormalizedChoice { delta: NormalizedDelta { content: Some(content.into()) }, finish_reason: None }] }
    }

    pub fn finished() -> Self {
        Self { choices: vec![NormalizedChoice { delta: NormalizedDelta::default(), finish_reason: Some("stop".to_string()) }] }
    }
}
