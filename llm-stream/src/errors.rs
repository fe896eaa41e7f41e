use thiserror::Error;

/// LLM transport failure modes (§4.9).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM transport error calling {backend}: {cause}")]
    Transport { backend: &'static str, cause: String },

    #[error("LLM request to {backend} timed out after {elapsed_ms}ms")]
    Timeout { backend: &'static str, elapsed_ms: u64 },

    #[error("LLM response from {backend} was malformed: {cause}")]
    Malformed { backend: &'static str, cause: String },
}

impl LlmError {
    pub fn transport(backend: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return LlmError::Timeout { backend, elapsed_ms: 0 };
        }
        LlmError::Transport { backend, cause: err.to_string() }
    }
}

pub type LlmResult<T> = Result<T, LlmError>;
