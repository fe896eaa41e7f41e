//! `GET /healthz` (§6, ambient): process liveness plus a best-effort probe
//! of the configured LLM backend, grounded in this codebase's existing
//! health-check convention (a resilient probe that never fails the
//! endpoint itself, only flags the backend as unreachable).

use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::warn;

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmHealth {
    kind: &'static str,
    endpoint: String,
    ok: bool,
    latency_ms: u128,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    status: &'static str,
    llm: LlmHealth,
}

async fn probe_llm(state: &AppState) -> LlmHealth {
    let (kind, endpoint) = match state.config.llm_kind {
        llm_stream::LlmKind::Ollama => ("ollama", format!("{}/api/tags", state.config.llm_endpoint.trim_end_matches('/'))),
        llm_stream::LlmKind::OpenAi => ("openai", format!("{}/v1/models", state.config.llm_endpoint.trim_end_matches('/'))),
    };

    let client = reqwest::Client::new();
    let mut builder = client.get(&endpoint).timeout(Duration::from_secs(5));
    if let (llm_stream::LlmKind::OpenAi, Some(key)) = (state.config.llm_kind, &state.config.llm_api_key) {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }

    let started = Instant::now();
    match builder.send().await {
        Ok(resp) if resp.status().is_success() => LlmHealth { kind, endpoint, ok: true, latency_ms: started.elapsed().as_millis(), message: "reachable".to_string() },
        Ok(resp) => LlmHealth { kind, endpoint, ok: false, latency_ms: started.elapsed().as_millis(), message: format!("non-success status: {}", resp.status()) },
        Err(e) => {
            warn!(error = %e, "healthz: llm backend probe failed");
            LlmHealth { kind, endpoint, ok: false, latency_ms: started.elapsed().as_millis(), message: e.to_string() }
        }
    }
}

pub async fn get(State(state): State<AppState>) -> Json<HealthSnapshot> {
    let llm = probe_llm(&state).await;
    let status = if llm.ok { "ok" } else { "degraded" };
    Json(HealthSnapshot { status, llm })
}
