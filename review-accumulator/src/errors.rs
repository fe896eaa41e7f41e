use thiserror::Error;

/// Accumulation failure modes, per §4.5.
#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("accumulator input was empty or blank")]
    InvalidInput,

    #[error("no JSON object could be extracted from the model response (is the LLM configured for structured output?)")]
    NonJsonResponse,

    #[error("review result JSON failed schema validation at field `{field}`")]
    JsonValidationError { field: String },
}
