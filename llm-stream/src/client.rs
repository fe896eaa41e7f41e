//! Enum-dispatch facade over the two backends, mirroring the `ScmClient`
//! shape used for provider dispatch.

use reqwest::Client;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::{ChatMessage, LlmConfig, LlmKind};
use crate::errors::LlmResult;
use crate::normalize::NormalizedFrame;
use crate::ollama::OllamaClient;
use crate::openai::OpenAiClient;

#[derive(Debug, Clone)]
pub enum LlmClient {
    Ollama(OllamaClient),
    OpenAi(OpenAiClient),
}

impl LlmClient {
    pub fn from_config(config: LlmConfig) -> Self {
        let http = Client::new();
        match config.kind {
            LlmKind::Ollama => LlmClient::Ollama(OllamaClient::new(http, config)),
            LlmKind::OpenAi => LlmClient::OpenAi(OpenAiClient::new(http, config)),
        }
    }

    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> LlmResult<UnboundedReceiverStream<LlmResult<NormalizedFrame>>> {
        match self {
            LlmClient::Ollama(c) => c.stream_chat(messages).await,
            LlmClient::OpenAi(c) => c.stream_chat(messages).await,
        }
    }

    pub async fn generate(&self, messages: Vec<ChatMessage>) -> LlmResult<String> {
        match self {
            LlmClient::Ollama(c) => c.generate(messages).await,
            LlmClient::OpenAi(c) => c.generate(messages).await,
        }
    }
}
