//! Provider-agnostic data model for change requests and diffs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    GitHub,
    GitLab,
}

impl ProviderId {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "github" => Some(ProviderId::GitHub),
            "gitlab" => Some(ProviderId::GitLab),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::GitHub => "github",
            ProviderId::GitLab => "gitlab",
        }
    }
}

/// A repository identifier, keyed differently per provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RepositoryId {
    GitHub { owner: String, repo: String },
    GitLab { project_id: String },
}

impl RepositoryId {
    /// Parses the wire form of a `repoId` path segment (already
    /// URL-decoded) for the given provider (§6: GitHub `owner/repo`,
    /// GitLab numeric id or `group/subgroup/project`).
    pub fn parse(provider: ProviderId, raw: &str) -> Option<Self> {
        match provider {
            ProviderId::GitHub => {
                let mut parts = raw.splitn(2, '/');
                let owner = parts.next()?.trim();
                let repo = parts.next()?.trim();
                if owner.is_empty() || repo.is_empty() {
                    return None;
                }
                Some(RepositoryId::GitHub { owner: owner.to_string(), repo: repo.to_string() })
            }
            ProviderId::GitLab => {
                if raw.trim().is_empty() {
                    return None;
                }
                Some(RepositoryId::GitLab { project_id: raw.to_string() })
            }
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            RepositoryId::GitHub { owner, repo } => format!("{owner}/{repo}"),
            RepositoryId::GitLab { project_id } => project_id.clone(),
        }
    }
}

/// A change request (PR/MR) identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ChangeRequestId {
    Pr(u64),
    Mr(u64),
}

impl ChangeRequestId {
    pub fn number(&self) -> u64 {
        match self {
            ChangeRequestId::Pr(n) | ChangeRequestId::Mr(n) => *n,
        }
    }

    pub fn for_provider(provider: ProviderId, n: u64) -> Self {
        match provider {
            ProviderId::GitHub => ChangeRequestId::Pr(n),
            ProviderId::GitLab => ChangeRequestId::Mr(n),
        }
    }
}

/// Triple of SHAs used to bind inline comments reliably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRefs {
    pub base_sha: String,
    pub start_sha: Option<String>,
    pub head_sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// High-level change-request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub provider: ProviderId,
    pub repository: RepositoryId,
    pub id: ChangeRequestId,
    pub title: String,
    pub description: Option<String>,
    pub author: AuthorInfo,
    pub state: String,
    pub web_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub diff_refs: DiffRefs,
    pub labels: Vec<String>,
}

impl ChangeRequest {
    pub fn is_open(&self) -> bool {
        matches!(self.state.as_str(), "open" | "opened")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrCommit {
    pub id: String,
    pub title: String,
    pub message: Option<String>,
    pub author_name: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub web_url: Option<String>,
}

/// Fetched diff plus PR/MR metadata (§4.6 `getDiff`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffBundle {
    pub meta: ChangeRequest,
    pub commits: Vec<CrCommit>,
    pub document: diff_model::DiffDocument,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommentSide {
    Left,
    Right,
}

/// Provider-agnostic location of an inline comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentLocation {
    pub file_path: String,
    pub line: u32,
    pub side: CommentSide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineCommentDraft {
    pub location: CommentLocation,
    pub body: String,
    /// Stable key this draft is keyed by for idempotency purposes, usually
    /// `file:line`.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub inline_posted: usize,
    pub inline_skipped_duplicate: usize,
    pub fallback_posted: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: String,
    pub display_name: String,
    pub web_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub web_url: String,
}
