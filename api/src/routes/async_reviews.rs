//! Async submission + status lookup (§4.7, §4.8). These surfaces reuse the
//! dispatcher's producer and status store but skip the idempotency gate.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use dispatcher::{AsyncRequest, RequestStatus, ReviewMode, StatusEntry};
use serde::Serialize;
use tracing::info;

use crate::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::{ReviewModeBody, decode_repo_id, parse_provider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    request_id: String,
    status: RequestStatus,
    status_url: String,
}

#[tracing::instrument(skip(state, body), fields(%provider, %repo_id, change_request_id = n))]
pub async fn submit(
    State(state): State<AppState>,
    Path((provider, repo_id, n)): Path<(String, String, u64)>,
    Query(query): Query<ReviewModeBody>,
) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;
    let repo_id = decode_repo_id(&repo_id)?;
    if n == 0 {
        return Err(AppError::Validation { message: "Change request ID must be positive".to_string() });
    }

    let mode = ReviewMode::coerce(query.review_mode.as_deref());
    let request = AsyncRequest::new(provider, repo_id, n, mode, None);

    match state.dispatcher.producer.send(request.clone()).await {
        Ok(()) => {
            state.dispatcher.status.put(request.request_id.clone(), StatusEntry::pending()).await;
            info!(request_id = %request.request_id, mode = ?request.mode, "async review submitted");
            let body = SubmitResponse {
                status_url: format!("/api/v1/async-reviews/{}/status", request.request_id),
                request_id: request.request_id,
                status: RequestStatus::Pending,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        Err(e) => {
            let body = SubmitResponse { request_id: request.request_id, status: RequestStatus::Failed, status_url: String::new() };
            tracing::error!(error = %e, "failed to enqueue async review");
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    request_id: String,
    status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<review_model::ReviewResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<u64>,
}

impl StatusResponse {
    fn from_entry(request_id: String, entry: Option<StatusEntry>) -> Self {
        match entry {
            Some(e) => Self { request_id, status: e.status, result: e.result, error: e.error, processing_time_ms: e.processing_time_ms },
            None => Self { request_id, status: RequestStatus::Pending, result: None, error: None, processing_time_ms: None },
        }
    }
}

/// Missing key tolerated as PENDING (§8 property 1, §4.8 propagation race).
#[tracing::instrument(skip(state))]
pub async fn status(State(state): State<AppState>, Path(request_id): Path<String>) -> AppResult<Json<StatusResponse>> {
    let entry = state.dispatcher.status.get(&request_id).await;
    Ok(Json(StatusResponse::from_entry(request_id, entry)))
}

/// Same body as [`status`], but 404s once the key is absent (§6) — unlike
/// `/status`, this surface does not tolerate the propagation race.
#[tracing::instrument(skip(state))]
pub async fn get_by_id(State(state): State<AppState>, Path(request_id): Path<String>) -> AppResult<Json<StatusResponse>> {
    let entry = state.dispatcher.status.get(&request_id).await;
    match entry {
        Some(entry) => Ok(Json(StatusResponse::from_entry(request_id, Some(entry)))),
        None => Err(AppError::NotFound { message: format!("no async review found for requestId {request_id}") }),
    }
}
