pub mod async_reviews;
pub mod healthz;
pub mod reviews;
pub mod webhooks;

use serde::Deserialize;

/// Shared JSON body shape for `POST /webhooks` and `POST .../change-requests/{n}`
/// submissions — the latter only uses `review_mode`, everything else comes
/// from the path.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewModeBody {
    pub review_mode: Option<String>,
}

/// Decodes a `repoId` path segment, which may itself contain `/` once
/// URL-decoded (§6).
pub fn decode_repo_id(raw: &str) -> Result<String, crate::error_handler::AppError> {
    urlencoding::decode(raw)
        .map(|cow| cow.into_owned())
        .map_err(|e| crate::error_handler::AppError::Validation { message: format!("repoId is not valid UTF-8/percent-encoding: {e}") })
}

pub fn parse_provider(raw: &str) -> Result<scm::ProviderId, crate::error_handler::AppError> {
    scm::ProviderId::parse(raw).ok_or_else(|| crate::error_handler::AppError::Validation { message: "Provider must be 'github' or 'gitlab'".to_string() })
}
