//! Ollama backend: `POST {endpoint}/api/chat`, newline-delimited JSON
//! response terminated by an object with `done: true` (§4.9).

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::config::{ChatMessage, LlmConfig};
use crate::errors::{LlmError, LlmResult};
use crate::normalize::NormalizedFrame;

const BACKEND: &str = "ollama";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatFrame {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
}

impl OllamaClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint.trim_end_matches('/'))
    }

    /// Starts a streaming chat call; frames are normalised and delivered on
    /// the returned stream as they arrive, one task per call (§4.4
    /// concurrency contract: a finite lazy sequence of chunks).
    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> LlmResult<UnboundedReceiverStream<LlmResult<NormalizedFrame>>> {
        let req = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: true,
            options: ChatOptions { temperature: self.config.temperature, top_p: self.config.top_p },
        };

        debug!(url = %self.url("/api/chat"), "ollama: starting streaming chat call");
        let resp = self
            .http
            .post(self.url("/api/chat"))
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmError::transport(BACKEND, e))?;

        let resp = resp.error_for_status().map_err(|e| LlmError::transport(BACKEND, e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut bytes_stream = resp.bytes_stream();
            let mut saw_any_frame = false;

            while let Some(chunk) = bytes_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::transport(BACKEND, e)));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<OllamaChatFrame>(&line) {
                        Ok(frame) => {
                            saw_any_frame = true;
                            let content = frame.message.map(|m| m.content).filter(|c| !c.is_empty());
                            let normalized = match (content, frame.done) {
                                (Some(c), _) => NormalizedFrame::with_content(c),
                                (None, true) => NormalizedFrame::finished(),
                                (None, false) => continue,
                            };
                            if tx.send(Ok(normalized)).is_err() {
                                return;
                            }
                            if frame.done {
                                return;
                            }
                        }
                        Err(e) => {
                            // Malformed frames are skipped silently per §4.4.
                            warn!(error = %e, line, "ollama: skipping malformed NDJSON frame");
                        }
                    }
                }
            }

            if !saw_any_frame {
                let _ = tx.send(Err(LlmError::Malformed { backend: BACKEND, cause: "empty response body, no frames received".to_string() }));
            }
        });

        Ok(UnboundedReceiverStream::new(rx))
    }

    /// Non-streaming entry point used for health checks, mirroring the
    /// streaming request's construction.
    pub async fn generate(&self, messages: Vec<ChatMessage>) -> LlmResult<String> {
        let req = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            stream: false,
            options: ChatOptions { temperature: self.config.temperature, top_p: self.config.top_p },
        };

        let resp: OllamaChatFrame = self
            .http
            .post(self.url("/api/chat"))
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmError::transport(BACKEND, e))?
            .error_for_status()
            .map_err(|e| LlmError::transport(BACKEND, e))?
            .json()
            .await
            .map_err(|e| LlmError::Malformed { backend: BACKEND, cause: e.to_string() })?;

        Ok(resp.message.map(|m| m.content).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig { kind: crate::config::LlmKind::Ollama, endpoint, model: "llama3".into(), api_key: None, temperature: 0.2, top_p: 0.9, max_tokens: None }
    }

    #[tokio::test]
    async fn streams_ndjson_frames_until_done() {
        let server = MockServer::start().await;
        let body = "{\"message\":{\"content\":\"hel\"},\"done\":false}\n{\"message\":{\"content\":\"lo\"},\"done\":false}\n{\"done\":true}\n";
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(Client::new(), config(server.uri()));
        let mut stream = client.stream_chat(vec![ChatMessage::user("hi")]).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.content(), Some("hel"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.content(), Some("lo"));
        let third = stream.next().await.unwrap().unwrap();
        assert!(third.is_finished());
    }

    #[tokio::test]
    async fn empty_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).and(path("/api/chat")).respond_with(ResponseTemplate::new(200).set_body_raw("", "application/x-ndjson")).mount(&server).await;

        let client = OllamaClient::new(Client::new(), config(server.uri()));
        let mut stream = client.stream_chat(vec![ChatMessage::user("hi")]).await.unwrap();
        let result = stream.next().await.unwrap();
        assert!(matches!(result, Err(LlmError::Malformed { .. })));
    }
}
