//! Synchronous review surfaces (§6): listings, the SSE streaming
//! endpoints, direct review submission, and issue lookup. The streaming
//! endpoints reuse the dispatcher's status store so `GET .../status` still
//! reports a consistent PENDING/PROCESSING/COMPLETED view for them, but run
//! the pipeline inline rather than through the queued worker — a live
//! per-token SSE relay can't wait behind the batch-oriented worker
//! contract (recorded as a resolved open question in DESIGN.md).

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use dispatcher::{AsyncRequest, ReviewMode, StatusEntry};
use futures::stream::{Stream, StreamExt};
use scm::{ChangeRequestId, ProviderId, RepositoryId};
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::routes::{decode_repo_id, parse_provider};

fn parse_repository(provider: ProviderId, repo_id: &str) -> AppResult<RepositoryId> {
    RepositoryId::parse(provider, repo_id).ok_or_else(|| AppError::Validation { message: "repositoryId is malformed for the given provider".to_string() })
}

#[tracing::instrument(skip(state))]
pub async fn list_change_requests(State(state): State<AppState>, Path((provider, repo_id)): Path<(String, String)>) -> AppResult<Json<Vec<scm::ChangeRequestSummary>>> {
    let provider = parse_provider(&provider)?;
    let repo_id = decode_repo_id(&repo_id)?;
    let repository = parse_repository(provider, &repo_id)?;

    let client = state.scm_client(provider);
    let summaries = client.get_open_change_requests(&repository).await?;
    Ok(Json(summaries))
}

#[tracing::instrument(skip(state))]
pub async fn list_repositories(State(state): State<AppState>, Path(provider): Path<String>) -> AppResult<Json<Vec<scm::RepositorySummary>>> {
    let provider = parse_provider(&provider)?;
    let client = state.scm_client(provider);
    let summaries = client.list_accessible_repositories().await?;
    Ok(Json(summaries))
}

/// Runs the pipeline inline, fanning the engine's broadcast out to the SSE
/// client while an internal subscriber accumulates the same chunks to
/// populate the status store and, when `auto_publish`, post the review.
async fn run_inline(state: &AppState, provider: ProviderId, repository_id: String, n: u64, auto_publish: bool) -> AppResult<(String, impl Stream<Item = Result<Event, Infallible>>)> {
    let repository = parse_repository(provider, &repository_id)?;
    let cr_id = ChangeRequestId::for_provider(provider, n);

    let request = AsyncRequest::new(provider, repository_id, n, ReviewMode::Diff, Some("sync-stream".to_string()));
    state.dispatcher.status.put(request.request_id.clone(), StatusEntry::processing()).await;

    let scm_client = state.scm_client(provider);
    let bundle = scm_client.get_diff(&repository, cr_id).await?;
    let messages = dispatcher::build_messages(&bundle);

    let llm = state.llm_client();
    let engine = llm_stream::start(&llm, messages, 64).await?;

    let sse_subscriber = engine.subscribe();
    let accumulate_subscriber = engine.subscribe();

    let deps = state.pipeline_deps.clone();
    let status = state.dispatcher.status.clone();
    let request_for_task = request.clone();

    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = collect_and_accumulate(accumulate_subscriber, deps.accumulator_config).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                status.put(request_for_task.request_id.clone(), StatusEntry::completed(result.clone(), elapsed_ms)).await;
                if auto_publish {
                    let split = line_anchor::route(&bundle.document, &result);
                    let drafts = dispatcher::build_inline_drafts(&split.valid, provider);
                    let fallback = dispatcher::build_fallback_body(&split.invalid);
                    match scm_client.publish_review(&repository, &bundle.meta, &request_for_task.request_id, &drafts, fallback.as_deref()).await {
                        Ok(outcome) => info!(inline = outcome.inline_posted, fallback = outcome.fallback_posted, "stream-and-publish: published"),
                        Err(e) => warn!(error = %e, "stream-and-publish: publish step failed"),
                    }
                }
            }
            Err(e) => {
                status.put(request_for_task.request_id.clone(), StatusEntry::failed(e.to_string(), elapsed_ms)).await;
            }
        }
    });

    let sse_stream = BroadcastStream::new(sse_subscriber).filter_map(|item| async move {
        match item {
            Ok(llm_stream::EngineEvent::Chunk(chunk)) => Some(Ok(Event::default().event("chunk").json_data(&chunk).unwrap_or_else(|_| Event::default()))),
            Ok(llm_stream::EngineEvent::Done) => Some(Ok(Event::default().event("done").data("{}"))),
            Ok(llm_stream::EngineEvent::Error(cause)) => Some(Ok(Event::default().event("error").data(cause))),
            Err(_lagged) => None,
        }
    });

    Ok((request.request_id, sse_stream))
}

async fn collect_and_accumulate(mut subscriber: tokio::sync::broadcast::Receiver<llm_stream::EngineEvent>, config: review_accumulator::AccumulatorConfig) -> AppResult<review_model::ReviewResult> {
    use tokio::sync::broadcast::error::RecvError;

    let mut chunks = Vec::new();
    loop {
        match subscriber.recv().await {
            Ok(llm_stream::EngineEvent::Chunk(chunk)) => chunks.push(chunk),
            Ok(llm_stream::EngineEvent::Done) => break,
            Ok(llm_stream::EngineEvent::Error(cause)) => return Err(AppError::Llm(llm_stream::LlmError::Malformed { backend: "engine", cause })),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
    Ok(review_accumulator::accumulate(&chunks, config)?)
}

#[tracing::instrument(skip(state))]
pub async fn stream(State(state): State<AppState>, Path((provider, repo_id, n)): Path<(String, String, u64)>) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;
    let repo_id = decode_repo_id(&repo_id)?;
    let (request_id, stream) = run_inline(&state, provider, repo_id, n, false).await?;
    info!(request_id, "stream: opened SSE review stream");
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}

#[tracing::instrument(skip(state))]
pub async fn stream_and_publish(State(state): State<AppState>, Path((provider, repo_id, n)): Path<(String, String, u64)>) -> AppResult<Response> {
    let provider = parse_provider(&provider)?;
    let repo_id = decode_repo_id(&repo_id)?;
    let (request_id, stream) = run_inline(&state, provider, repo_id, n, true).await?;
    info!(request_id, "stream-and-publish: opened SSE review stream");
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReviewResponse {
    status: &'static str,
    message: String,
    provider: &'static str,
    repository: String,
    change_request_id: u64,
}

/// Directly publishes a caller-supplied `ReviewResult`, bypassing the LLM
/// and accumulator entirely.
#[tracing::instrument(skip(state, body))]
pub async fn submit_review(State(state): State<AppState>, Path((provider, repo_id, n)): Path<(String, String, u64)>, Json(body): Json<review_model::ReviewResult>) -> AppResult<Json<SubmitReviewResponse>> {
    let provider = parse_provider(&provider)?;
    let repo_id = decode_repo_id(&repo_id)?;
    let repository = parse_repository(provider, &repo_id)?;
    let cr_id = ChangeRequestId::for_provider(provider, n);

    let client = state.scm_client(provider);
    let bundle = client.get_diff(&repository, cr_id).await?;

    let split = line_anchor::route(&bundle.document, &body);
    let drafts = dispatcher::build_inline_drafts(&split.valid, provider);
    let fallback = dispatcher::build_fallback_body(&split.invalid);

    let request_id = uuid::Uuid::new_v4().to_string();
    let outcome = client.publish_review(&repository, &bundle.meta, &request_id, &drafts, fallback.as_deref()).await?;

    Ok(Json(SubmitReviewResponse {
        status: "published",
        message: format!("posted {} inline comment(s){}", outcome.inline_posted, if outcome.fallback_posted { " and a fallback summary" } else { "" }),
        provider: provider.as_str(),
        repository: repo_id,
        change_request_id: n,
    }))
}

/// Issue ids are minted as `{requestId}#{index}` against a completed
/// review's issue list — `Issue` carries no intrinsic id (DESIGN.md).
pub async fn get_issue(State(state): State<AppState>, Path(issue_id): Path<String>) -> Response {
    match lookup_issue(&state, &issue_id).await {
        Some(issue) => (StatusCode::OK, Json(issue)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({"status": "error", "message": "Issue not found"}))).into_response(),
    }
}

async fn lookup_issue(state: &AppState, issue_id: &str) -> Option<review_model::Issue> {
    let (request_id, index) = issue_id.split_once('#')?;
    let index: usize = index.parse().ok()?;
    let entry = state.dispatcher.status.get(request_id).await?;
    let result = entry.result?;
    result.issues.get(index).cloned()
}
