//! LLM transport and the Streaming Review Engine (§4.4, §4.9): normalises
//! Ollama's NDJSON and OpenAI-compatible SSE wire formats into a single
//! engine-facing frame shape, then fans the resulting stream out to
//! whichever subscribers the caller wires up.

mod client;
mod config;
mod engine;
mod errors;
mod normalize;
mod ollama;
mod openai;

pub use client::LlmClient;
pub use config::{ChatMessage, LlmConfig, LlmKind};
pub use engine::{start, EngineEvent, ReviewStreamEngine};
pub use errors::{LlmError, LlmResult};
pub use normalize::{NormalizedChoice, NormalizedDelta, NormalizedFrame};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
