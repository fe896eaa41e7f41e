use std::sync::Arc;

use dispatcher::{Dispatcher, DispatcherSettings, NoopSecurityScanner, PipelineDeps};

use crate::config::AppConfig;

/// Shared state handed to every handler: immutable config plus the
/// dispatcher's producer/stores and the SCM/LLM clients workers use.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub pipeline_deps: Arc<PipelineDeps>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let llm_client = llm_stream::LlmClient::from_config(config.llm_config());
        let pipeline_deps = Arc::new(PipelineDeps::new(&config.scm_config(), llm_client, config.accumulator_config(), Arc::new(NoopSecurityScanner), 64));

        let settings = DispatcherSettings {
            workers_per_mode: config.workers_per_mode,
            job_deadline: config.job_deadline,
            status_ttl: config.status_ttl,
            idempotency_ttl: config.idempotency_ttl,
            stream_capacity: 256,
            auto_publish: false,
        };
        let dispatcher = Arc::new(Dispatcher::spawn(pipeline_deps.clone(), settings));

        Self { config, dispatcher, pipeline_deps }
    }

    /// Builds a short-lived SCM client for handlers that need direct
    /// provider access (listing, streaming) outside the worker pipeline.
    pub fn scm_client(&self, provider: scm::ProviderId) -> scm::ScmClient {
        scm::ScmClient::from_config(provider, &self.config.scm_config())
    }

    pub fn llm_client(&self) -> llm_stream::LlmClient {
        llm_stream::LlmClient::from_config(self.config.llm_config())
    }
}
