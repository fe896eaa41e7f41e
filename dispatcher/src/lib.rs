//! Async dispatch: the two named streams, the status/idempotency stores,
//! and the per-stream worker pool that drives the DIFF/AGENTIC pipelines
//! (§4.7, §4.8).

mod errors;
mod idempotency_store;
mod pipeline;
mod prompt;
mod security_scanner;
mod status_store;
mod stream_bus;
#[cfg(test)]
mod test_support;
mod types;
mod worker;

pub use errors::{DispatcherError, DispatcherResult};
pub use idempotency_store::{IdempotencyStore, Sighting};
pub use pipeline::PipelineDeps;
pub use prompt::build_messages;
pub use scm::{build_fallback_body, build_inline_drafts};
pub use security_scanner::{NoopSecurityScanner, ScanFindings, SecurityScanner};
pub use status_store::StatusStore;
pub use stream_bus::{StreamBus, StreamProducer, AGENTIC_STREAM_NAME, DIFF_STREAM_NAME};
pub use types::{AsyncRequest, RequestStatus, ReviewMode, StatusEntry};

use std::sync::Arc;
use std::time::Duration;

/// Tunables a caller wires from `AppConfig` (§4.10).
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub workers_per_mode: usize,
    pub job_deadline: Duration,
    pub status_ttl: Duration,
    pub idempotency_ttl: Duration,
    pub stream_capacity: usize,
    pub auto_publish: bool,
}

/// The assembled dispatcher: producer, stores, and the spawned worker
/// pool. Construction is explicit; there is no ambient container (§9).
pub struct Dispatcher {
    pub producer: StreamProducer,
    pub status: StatusStore,
    pub idempotency: IdempotencyStore,
}

impl Dispatcher {
    /// Builds the stream bus and stores, then spawns one worker task per
    /// stream (each internally bounded to `settings.workers_per_mode`
    /// concurrent jobs via a semaphore).
    pub fn spawn(deps: Arc<PipelineDeps>, settings: DispatcherSettings) -> Self {
        let bus = StreamBus::new(settings.stream_capacity);
        let status = StatusStore::new(settings.status_ttl);
        let idempotency = IdempotencyStore::new(settings.idempotency_ttl);

        status.spawn_sweeper(Duration::from_secs(60));
        idempotency.spawn_sweeper(Duration::from_secs(60));

        tokio::spawn(worker::run(bus.diff_rx, deps.clone(), status.clone(), settings.workers_per_mode, settings.job_deadline, settings.auto_publish));
        tokio::spawn(worker::run(bus.agentic_rx, deps, status.clone(), settings.workers_per_mode, settings.job_deadline, settings.auto_publish));

        Self { producer: bus.producer, status, idempotency }
    }
}
