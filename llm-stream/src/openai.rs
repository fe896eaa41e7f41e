//! OpenAI-compatible backend: `POST {endpoint}/v1/chat/completions`,
//! `text/event-stream` response terminated by the literal line
//! `data: [DONE]` (§4.9). The wire shape already matches the engine-facing
//! `{choices:[{delta:{content},finish_reason}]}` frame.

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::config::{ChatMessage, LlmConfig};
use crate::errors::{LlmError, LlmResult};
use crate::normalize::NormalizedFrame;

const BACKEND: &str = "openai";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiCompletion {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: String,
}

impl OpenAiClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint.trim_end_matches('/'))
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> reqwest::RequestBuilder {
        let req = ChatRequest {
            model: &self.config.model,
            messages,
            stream,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self.http.post(self.url("/v1/chat/completions")).json(&req);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    pub async fn stream_chat(&self, messages: Vec<ChatMessage>) -> LlmResult<UnboundedReceiverStream<LlmResult<NormalizedFrame>>> {
        debug!(url = %self.url("/v1/chat/completions"), "openai: starting streaming chat call");
        let resp = self
            .request(&messages, true)
            .send()
            .await
            .map_err(|e| LlmError::transport(BACKEND, e))?
            .error_for_status()
            .map_err(|e| LlmError::transport(BACKEND, e))?;

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
                    let Some(payload) = line.strip_prefix("data:") else { continue };
                    let payload = payload.trim();
                    if payload.is_empty() {
                        continue;
                    }
                    if payload == DONE_SENTINEL {
                        saw_any_frame = true;
                        let _ = tx.send(Ok(NormalizedFrame::finished()));
                        return;
                    }

                    match serde_json::from_str::<NormalizedFrame>(payload) {
                        Ok(frame) => {
                            saw_any_frame = true;
                            if tx.send(Ok(frame)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, payload, "openai: skipping malformed SSE frame");
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

    pub async fn generate(&self, messages: Vec<ChatMessage>) -> LlmResult<String> {
        let resp: OpenAiCompletion = self
            .request(&messages, false)
            .send()
            .await
            .map_err(|e| LlmError::transport(BACKEND, e))?
            .error_for_status()
            .map_err(|e| LlmError::transport(BACKEND, e))?
            .json()
            .await
            .map_err(|e| LlmError::Malformed { backend: BACKEND, cause: e.to_string() })?;

        Ok(resp.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig { kind: crate::config::LlmKind::OpenAi, endpoint, model: "gpt-4o-mini".into(), api_key: Some("sk-test".into()), temperature: 0.2, top_p: 0.9, max_tokens: None }
    }

    #[tokio::test]
    async fn streams_sse_frames_until_done_sentinel() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(Client::new(), config(server.uri()));
        let mut stream = client.stream_chat(vec![ChatMessage::user("hi")]).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.content(), Some("hel"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.content(), Some("lo"));
        let third = stream.next().await.unwrap().unwrap();
        assert!(third.is_finished());
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        let body = "data: not-json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\ndata: [DONE]\n";
        Mock::given(method("POST")).and(path("/v1/chat/completions")).respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")).mount(&server).await;

        let client = OpenAiClient::new(Client::new(), config(server.uri()));
        let mut stream = client.stream_chat(vec![ChatMessage::user("hi")]).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.content(), Some("ok"));
    }
}
