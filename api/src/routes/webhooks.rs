//! `POST /webhooks` (§4.7): API-key gated ingress with an optional
//! idempotency key. Validation failures are distinct, field-naming errors;
//! a replayed idempotency key short-circuits straight to the previously
//! minted `requestId`.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use dispatcher::{AsyncRequest, ReviewMode, Sighting, StatusEntry};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app_state::AppState;
use crate::error_handler::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub provider: Option<String>,
    pub repository_id: Option<String>,
    pub change_request_id: Option<i64>,
    pub trigger_source: Option<String>,
    pub review_mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookResponse {
    request_id: String,
    status: &'static str,
    message: &'static str,
}

#[tracing::instrument(skip(state, headers, payload), fields(provider))]
pub async fn post_webhook(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<WebhookPayload>) -> AppResult<Response> {
    let api_key = headers.get("X-API-Key").and_then(|v| v.to_str().ok()).unwrap_or("").trim();
    if api_key.is_empty() || !state.config.is_known_api_key(api_key) {
        return Err(AppError::Unauthorized);
    }
    if !state.config.webhooks_enabled {
        return Err(AppError::Forbidden);
    }

    let provider = match payload.provider.as_deref() {
        None | Some("") => return Err(AppError::Validation { message: "Provider is required".to_string() }),
        Some(raw) => scm::ProviderId::parse(raw).ok_or_else(|| AppError::Validation { message: "Provider must be 'github' or 'gitlab'".to_string() })?,
    };

    let repository_id = match payload.repository_id.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::Validation { message: "repositoryId is required".to_string() }),
        Some(v) => v.to_string(),
    };

    let change_request_id = match payload.change_request_id {
        None => return Err(AppError::Validation { message: "changeRequestId is required".to_string() }),
        Some(n) if n <= 0 => return Err(AppError::Validation { message: "Change request ID must be positive".to_string() }),
        Some(n) => n as u64,
    };

    let mode = ReviewMode::coerce(payload.review_mode.as_deref());
    let request = AsyncRequest::new(provider, repository_id, change_request_id, mode, payload.trigger_source.clone());

    if let Some(idempotency_key) = headers.get("X-Idempotency-Key").and_then(|v| v.to_str().ok()).filter(|v| !v.is_empty()) {
        match state.dispatcher.idempotency.sight(idempotency_key, &request.request_id).await {
            Sighting::Replay { request_id } => {
                info!(request_id, "webhook: idempotency replay");
                let body = WebhookResponse { request_id, status: "already_processed", message: "Review request already queued" };
                return Ok((StatusCode::OK, Json(body)).into_response());
            }
            Sighting::First => {}
        }
    }

    state.dispatcher.producer.send(request.clone()).await?;
    state.dispatcher.status.put(request.request_id.clone(), StatusEntry::pending()).await;

    info!(request_id = %request.request_id, mode = ?request.mode, "webhook: review request queued");
    let body = WebhookResponse { request_id: request.request_id, status: "accepted", message: "Review request queued for processing" };
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}
