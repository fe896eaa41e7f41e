use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::errors::ScmResult;
use crate::github::GitHubClient;
use crate::gitlab::GitLabClient;
use crate::types::*;

/// Per-provider connection settings, normally sourced from `AppConfig`.
#[derive(Debug, Clone)]
pub struct ScmConfig {
    pub github_api_base: String,
    pub github_token: String,
    pub gitlab_api_base: String,
    pub gitlab_token: String,
}

/// Provider facade with enum dispatch (no `dyn Trait`/`async-trait`),
/// matching the provider-client style already established in this
/// codebase's other adapters.
#[derive(Debug, Clone)]
pub enum ScmClient {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
}

impl ScmClient {
    pub fn from_config(provider: ProviderId, config: &ScmConfig) -> Self {
        let http = Client::builder().user_agent("review-gateway/0.1").build().expect("static client config");

        match provider {
            ProviderId::GitHub => ScmClient::GitHub(GitHubClient::new(http, config.github_api_base.clone(), config.github_token.clone())),
            ProviderId::GitLab => ScmClient::GitLab(GitLabClient::new(http, config.gitlab_api_base.clone(), config.gitlab_token.clone())),
        }
    }

    pub async fn get_diff(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<DiffBundle> {
        match self {
            ScmClient::GitHub(c) => c.get_diff(repo, id).await,
            ScmClient::GitLab(c) => c.get_diff(repo, id).await,
        }
    }

    pub async fn is_change_request_open(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<bool> {
        match self {
            ScmClient::GitHub(c) => c.is_change_request_open(repo, id).await,
            ScmClient::GitLab(c) => c.is_change_request_open(repo, id).await,
        }
    }

    pub async fn get_repository(&self, repo: &RepositoryId) -> ScmResult<RepositorySummary> {
        match self {
            ScmClient::GitHub(c) => c.get_repository(repo).await,
            ScmClient::GitLab(c) => c.get_repository(repo).await,
        }
    }

    pub async fn get_open_change_requests(&self, repo: &RepositoryId) -> ScmResult<Vec<ChangeRequestSummary>> {
        match self {
            ScmClient::GitHub(c) => c.get_open_change_requests(repo).await,
            ScmClient::GitLab(c) => c.get_open_change_requests(repo).await,
        }
    }

    /// Repositories the configured token can see. GitHub lists the token's
    /// own repositories (`GET /user/repos`); GitLab lists projects the
    /// token is a member of (`GET /projects?membership=true`). Neither
    /// needs an owner/group argument from the caller.
    pub async fn list_accessible_repositories(&self) -> ScmResult<Vec<RepositorySummary>> {
        match self {
            ScmClient::GitHub(c) => c.get_accessible_repositories().await,
            ScmClient::GitLab(c) => c.get_all_repositories().await,
        }
    }

    pub async fn get_file_content(&self, repo: &RepositoryId, path: &str, git_ref: &str) -> ScmResult<Option<Vec<u8>>> {
        match self {
            ScmClient::GitHub(c) => c.get_file_content(repo, path, git_ref).await,
            ScmClient::GitLab(c) => c.get_file_content(repo, path, git_ref).await,
        }
    }

    pub async fn get_commits_for(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<Vec<CrCommit>> {
        match self {
            ScmClient::GitHub(c) => c.get_commits_for(repo, id).await,
            ScmClient::GitLab(c) => c.get_commits_for(repo, id).await,
        }
    }

    pub async fn get_commits_since(&self, repo: &RepositoryId, id: ChangeRequestId, since: DateTime<Utc>) -> ScmResult<Vec<CrCommit>> {
        match self {
            ScmClient::GitHub(c) => c.get_commits_since(repo, id, since).await,
            ScmClient::GitLab(c) => c.get_commits_since(repo, id, since).await,
        }
    }

    pub async fn publish_summary_comment(&self, repo: &RepositoryId, id: ChangeRequestId, body: &str) -> ScmResult<()> {
        match self {
            ScmClient::GitHub(c) => c.publish_summary_comment(repo, id, body).await,
            ScmClient::GitLab(c) => c.publish_summary_comment(repo, id, body).await,
        }
    }

    pub async fn publish_review(
        &self,
        repo: &RepositoryId,
        meta: &ChangeRequest,
        request_id: &str,
        drafts: &[InlineCommentDraft],
        fallback_body: Option<&str>,
    ) -> ScmResult<PublishOutcome> {
        match self {
            ScmClient::GitHub(c) => c.publish_review(repo, meta, request_id, drafts, fallback_body).await,
            ScmClient::GitLab(c) => c.publish_review(repo, meta, request_id, drafts, fallback_body).await,
        }
    }
}
