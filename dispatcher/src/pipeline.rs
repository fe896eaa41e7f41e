//! The DIFF and AGENTIC pipelines (§4.8 step 4): fetch the diff, run the
//! streaming review engine through the accumulator, optionally merge
//! security-scan findings, then split and publish.

use std::collections::HashMap;
use std::sync::Arc;

use review_accumulator::AccumulatorConfig;
use review_model::{ReviewChunk, ReviewResult};
use scm::{ChangeRequestId, DiffBundle, ProviderId, PublishOutcome, RepositoryId, ScmClient, ScmConfig};
use tokio::sync::broadcast;

use crate::errors::{DispatcherError, DispatcherResult};
use crate::security_scanner::SecurityScanner;
use crate::types::{AsyncRequest, ReviewMode};
use crate::{build_fallback_body, build_inline_drafts};

/// Everything a pipeline run needs that isn't specific to one request.
pub struct PipelineDeps {
    pub scm_clients: HashMap<ProviderId, ScmClient>,
    pub llm: Arc<llm_stream::LlmClient>,
    pub accumulator_config: AccumulatorConfig,
    pub scanner: Arc<dyn SecurityScanner>,
    pub fanout_buffer: usize,
}

impl PipelineDeps {
    pub fn new(scm_config: &ScmConfig, llm: llm_stream::LlmClient, accumulator_config: AccumulatorConfig, scanner: Arc<dyn SecurityScanner>, fanout_buffer: usize) -> Self {
        let mut scm_clients = HashMap::new();
        scm_clients.insert(ProviderId::GitHub, ScmClient::from_config(ProviderId::GitHub, scm_config));
        scm_clients.insert(ProviderId::GitLab, ScmClient::from_config(ProviderId::GitLab, scm_config));
        Self { scm_clients, llm: Arc::new(llm), accumulator_config, scanner, fanout_buffer }
    }

    fn scm_for(&self, provider: ProviderId) -> &ScmClient {
        self.scm_clients.get(&provider).expect("both providers are registered at startup")
    }
}

/// Runs the pipeline for `request`, returning the full (unsplit)
/// `ReviewResult` the status store records, plus the fetched diff bundle
/// for a subsequent [`publish`] call.
pub async fn execute(deps: &PipelineDeps, request: &AsyncRequest) -> DispatcherResult<(ReviewResult, DiffBundle)> {
    let repository = RepositoryId::parse(request.provider, &request.repository_id)
        .ok_or_else(|| DispatcherError::InvalidRepository(request.repository_id.clone()))?;
    let cr_id = ChangeRequestId::for_provider(request.provider, request.change_request_id);
    let scm = deps.scm_for(request.provider);

    let bundle = scm.get_diff(&repository, cr_id).await?;
    let messages = crate::prompt::build_messages(&bundle);

    let engine = llm_stream::start(&deps.llm, messages, deps.fanout_buffer).await?;
    let mut subscriber = engine.subscribe();
    let chunks = collect_chunks(&mut subscriber).await?;

    let mut result = review_accumulator::accumulate(&chunks, deps.accumulator_config)?;

    if request.mode == ReviewMode::Agentic {
        let findings = deps.scanner.scan(&bundle);
        result.issues.extend(findings.issues);
        result.notes.extend(findings.notes);
    }

    Ok((result, bundle))
}

async fn collect_chunks(subscriber: &mut broadcast::Receiver<llm_stream::EngineEvent>) -> DispatcherResult<Vec<ReviewChunk>> {
    let mut chunks = Vec::new();
    loop {
        match subscriber.recv().await {
            Ok(llm_stream::EngineEvent::Chunk(chunk)) => chunks.push(chunk),
            Ok(llm_stream::EngineEvent::Done) => break,
            Ok(llm_stream::EngineEvent::Error(cause)) => {
                return Err(DispatcherError::Llm(llm_stream::LlmError::Malformed { backend: "engine", cause }));
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    Ok(chunks)
}

/// Publishes `result` back to the SCM, routing valid findings to inline
/// comments and invalid ones to the fallback summary (§4.3, §4.6).
pub async fn publish(deps: &PipelineDeps, request: &AsyncRequest, bundle: &DiffBundle, result: &ReviewResult) -> DispatcherResult<PublishOutcome> {
    let repository = RepositoryId::parse(request.provider, &request.repository_id)
        .ok_or_else(|| DispatcherError::InvalidRepository(request.repository_id.clone()))?;
    let scm = deps.scm_for(request.provider);

    let split = line_anchor::route(&bundle.document, result);
    let drafts = build_inline_drafts(&split.valid, request.provider);
    let fallback = build_fallback_body(&split.invalid);

    let outcome = scm.publish_review(&repository, &bundle.meta, &request.request_id, &drafts, fallback.as_deref()).await?;
    Ok(outcome)
}
