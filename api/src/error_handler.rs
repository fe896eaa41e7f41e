//! Top-level HTTP error type: the single place that maps a taxonomy kind
//! to a status code and the stable `{error, message}` envelope (§7).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error(transparent)]
    Scm(#[from] scm::ScmError),

    #[error(transparent)]
    Llm(#[from] llm_stream::LlmError),

    #[error(transparent)]
    Accumulate(#[from] review_accumulator::AccumulatorError),

    #[error(transparent)]
    Dispatch(#[from] dispatcher::DispatcherError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Scm(e) => match e.kind {
                scm::ScmErrorKind::Auth => StatusCode::UNAUTHORIZED,
                scm::ScmErrorKind::NotFound => StatusCode::NOT_FOUND,
                scm::ScmErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                scm::ScmErrorKind::Malformed | scm::ScmErrorKind::Transport => StatusCode::BAD_GATEWAY,
            },
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Accumulate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "disabled",
            AppError::NotFound { .. } => "not_found",
            AppError::Scm(_) => "scm_error",
            AppError::Llm(_) => "llm_error",
            AppError::Accumulate(_) => "json_validation_error",
            AppError::Dispatch(_) => "internal_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody { error: self.error_kind(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation { message: err.to_string() }
    }
}
