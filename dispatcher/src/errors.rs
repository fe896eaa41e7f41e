use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("invalid repository id {0:?} for the given provider")]
    InvalidRepository(String),

    #[error(transparent)]
    Scm(#[from] scm::ScmError),

    #[error(transparent)]
    Llm(#[from] llm_stream::LlmError),

    #[error(transparent)]
    Accumulate(#[from] review_accumulator::AccumulatorError),

    #[error("failed to enqueue request: {0}")]
    Send(String),
}

pub type DispatcherResult<T> = Result<T, DispatcherError>;
