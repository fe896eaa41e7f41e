use thiserror::Error;

/// Taxonomy of SCM adapter failures (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScmErrorKind {
    Auth,
    NotFound,
    RateLimited,
    Malformed,
    Transport,
}

impl ScmErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScmErrorKind::Auth => "AUTH",
            ScmErrorKind::NotFound => "NOT_FOUND",
            ScmErrorKind::RateLimited => "RATE_LIMITED",
            ScmErrorKind::Malformed => "MALFORMED",
            ScmErrorKind::Transport => "TRANSPORT",
        }
    }
}

impl std::fmt::Display for ScmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed SCM adapter error: `{kind, provider, operation, cause}`.
#[derive(Debug, Error)]
#[error("scm error: provider={provider} operation={operation} kind={kind} cause={cause}")]
pub struct ScmError {
    pub kind: ScmErrorKind,
    pub provider: &'static str,
    pub operation: &'static str,
    pub cause: String,
}

impl ScmError {
    pub fn new(kind: ScmErrorKind, provider: &'static str, operation: &'static str, cause: impl Into<String>) -> Self {
        Self { kind, provider, operation, cause: cause.into() }
    }

    pub fn from_reqwest(err: reqwest::Error, provider: &'static str, operation: &'static str) -> Self {
        if err.is_timeout() {
            return Self::new(ScmErrorKind::Transport, provider, operation, "request timed out");
        }
        let kind = match err.status().map(|s| s.as_u16()) {
            Some(401) | Some(403) => ScmErrorKind::Auth,
            Some(404) => ScmErrorKind::NotFound,
            Some(429) => ScmErrorKind::RateLimited,
            Some(500..=599) | None => ScmErrorKind::Transport,
            Some(_) => ScmErrorKind::Transport,
        };
        Self::new(kind, provider, operation, err.to_string())
    }
}

pub type ScmResult<T> = Result<T, ScmError>;
