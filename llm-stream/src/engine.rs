//! Streaming Review Engine (§4.4): fans a single upstream LLM stream out to
//! multiple subscribers — typically a live SSE client and the internal
//! accumulator — each with independent back-pressure, neither starving the
//! other. When every subscriber has disconnected the producer stops polling
//! the upstream at its next chunk boundary instead of draining it to completion.

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::broadcast;

use crate::client::LlmClient;
use crate::config::ChatMessage;
use crate::errors::LlmResult;
use review_model::{ChunkType, ReviewChunk};

/// One event delivered to every subscriber of a [`ReviewStreamEngine`].
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Chunk(ReviewChunk),
    Done,
    Error(String),
}

/// A running fan-out over one upstream LLM call. Dropping every
/// [`broadcast::Receiver`] obtained from [`subscribe`](Self::subscribe) is
/// the cancellation signal: the background task notices at its next poll
/// and stops pulling further frames from the backend.
pub struct ReviewStreamEngine {
    tx: broadcast::Sender<EngineEvent>,
}

impl ReviewStreamEngine {
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

/// Starts the upstream call and spawns the fan-out task. `buffer` bounds how
/// far behind a slow subscriber may lag before it starts missing events.
pub async fn start(client: &LlmClient, messages: Vec<ChatMessage>, buffer: usize) -> LlmResult<ReviewStreamEngine> {
    let mut upstream = client.stream_chat(messages).await?;
    let (tx, _first_receiver) = broadcast::channel(buffer.max(16));
    let task_tx = tx.clone();

    tokio::spawn(async move {
        while let Some(frame) = upstream.next().await {
            if task_tx.receiver_count() == 0 {
                return;
            }

            match frame {
                Ok(normalized) => {
                    if let Some(content) = normalized.content() {
                        let chunk = ReviewChunk::new(ChunkType::Analysis, content, Utc::now());
                        if task_tx.send(EngineEvent::Chunk(chunk)).is_err() {
                            return;
                        }
                    }
                    if normalized.is_finished() {
                        let _ = task_tx.send(EngineEvent::Done);
                        return;
                    }
                }
                Err(e) => {
                    let _ = task_tx.send(EngineEvent::Error(e.to_string()));
                    return;
                }
            }
        }
        let _ = task_tx.send(EngineEvent::Done);
    });

    Ok(ReviewStreamEngine { tx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_event_is_cloneable_for_broadcast() {
        let ev = EngineEvent::Chunk(ReviewChunk::new(ChunkType::Analysis, "hi", Utc::now()));
        let cloned = ev.clone();
        match cloned {
            EngineEvent::Chunk(c) => assert_eq!(c.text, "hi"),
            _ => panic!("expected chunk"),
        }
    }
}
