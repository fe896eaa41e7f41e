//! Per-stream worker loop (§4.8 worker contract): reads the next record in
//! append order, drives PENDING -> PROCESSING -> COMPLETED/FAILED, and
//! optionally publishes the result back to the SCM on success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, info_span, warn, Instrument};

use crate::pipeline::{self, PipelineDeps};
use crate::status_store::StatusStore;
use crate::types::{AsyncRequest, StatusEntry};

/// Runs forever, pulling requests off `rx` in order and processing up to
/// `concurrency` of them at once (§5: a stream with more in-flight records
/// than permits simply queues behind the semaphore).
pub async fn run(mut rx: mpsc::Receiver<AsyncRequest>, deps: Arc<PipelineDeps>, status: StatusStore, concurrency: usize, job_deadline: Duration, auto_publish: bool) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    while let Some(request) = rx.recv().await {
        let deps = deps.clone();
        let status = status.clone();
        let permits = permits.clone();

        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.expect("semaphore is never closed");
            process_one(request, deps, status, job_deadline, auto_publish).await;
        });
    }
}

async fn process_one(request: AsyncRequest, deps: Arc<PipelineDeps>, status: StatusStore, job_deadline: Duration, auto_publish: bool) {
    let span = info_span!("review_job", request_id = %request.request_id, mode = ?request.mode);
    async move {
        status.put(request.request_id.clone(), StatusEntry::processing()).await;
        let started = Instant::now();

        let outcome = tokio::time::timeout(job_deadline, pipeline::execute(&deps, &request)).await;

        match outcome {
            Ok(Ok((result, bundle))) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(issues = result.issues.len(), notes = result.notes.len(), elapsed_ms, "review job completed");
                status.put(request.request_id.clone(), StatusEntry::completed(result.clone(), elapsed_ms)).await;

                if auto_publish {
                    match pipeline::publish(&deps, &request, &bundle, &result).await {
                        Ok(publish_outcome) => info!(inline = publish_outcome.inline_posted, fallback = publish_outcome.fallback_posted, "published review"),
                        Err(e) => warn!(error = %e, "publish step failed, result is still recorded as completed"),
                    }
                }
            }
            Ok(Err(e)) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                error!(error = %e, elapsed_ms, "review job failed");
                status.put(request.request_id.clone(), StatusEntry::failed(e.to_string(), elapsed_ms)).await;
            }
            Err(_elapsed) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                error!(elapsed_ms, "review job exceeded its deadline");
                status.put(request.request_id.clone(), StatusEntry::failed(format!("job exceeded deadline of {}s", job_deadline.as_secs()), elapsed_ms)).await;
            }
        }
    }
    .instrument(span)
    .await
}
