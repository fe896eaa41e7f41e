//! GitHub provider (REST v3) adapter.
//!
//! Endpoints used:
//!   * GET /repos/{owner}/{repo}
//!   * GET /repos/{owner}/{repo}/pulls/{number}
//!   * GET /repos/{owner}/{repo}/pulls/{number}/commits
//!   * GET /repos/{owner}/{repo}/pulls/{number}/files
//!   * GET /repos/{owner}/{repo}/pulls?state=open
//!   * GET /repos/{owner}/{repo}/contents/{path}?ref={ref}
//!   * POST /repos/{owner}/{repo}/pulls/{number}/comments
//!   * POST /repos/{owner}/{repo}/issues/{number}/comments
//!   * GET /repos/{owner}/{repo}/pulls/{number}/comments (idempotency)

use chrono::{DateTime, Utc};
use diff_model::parse_unified_diff;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ScmError, ScmErrorKind, ScmResult};
use crate::format;
use crate::idempotency;
use crate::types::*;

const PROVIDER: &str = "github";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
    token: String,
}

impl GitHubClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self { http, base_api, token }
    }

    fn owner_repo(repo: &RepositoryId) -> ScmResult<(&str, &str)> {
        match repo {
            RepositoryId::GitHub { owner, repo } => Ok((owner.as_str(), repo.as_str())),
            RepositoryId::GitLab { .. } => {
                Err(ScmError::new(ScmErrorKind::Malformed, PROVIDER, "owner_repo", "expected a GitHub repository id"))
            }
        }
    }

    pub async fn get_diff(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<DiffBundle> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let n = id.number();

        let url = format!("{}/repos/{owner}/{repo_name}/pulls/{n}", self.base_api);
        debug!(url, "github get_diff: fetching metadata");
        let resp: GitHubPr = self.get_json(&url).await?;

        let diff_refs = DiffRefs { base_sha: resp.base.sha, start_sha: None, head_sha: resp.head.sha.clone() };
        let author = AuthorInfo { id: resp.user.id.to_string(), username: Some(resp.user.login.clone()), name: Some(resp.user.login) };

        let meta = ChangeRequest {
            provider: ProviderId::GitHub,
            repository: repo.clone(),
            id,
            title: resp.title,
            description: resp.body,
            author,
            state: resp.state,
            web_url: resp.html_url,
            created_at: resp.created_at,
            updated_at: resp.updated_at,
            source_branch: Some(resp.head.r#ref),
            target_branch: Some(resp.base.r#ref),
            diff_refs,
            labels: resp.labels.into_iter().map(|l| l.name).collect(),
        };

        let commits_url = format!("{}/repos/{owner}/{repo_name}/pulls/{n}/commits", self.base_api);
        let raw_commits: Vec<GitHubPrCommit> = self.get_json(&commits_url).await?;
        let commits = raw_commits
            .into_iter()
            .map(|c| CrCommit {
                id: c.sha,
                title: c.commit.message.lines().next().unwrap_or("").to_string(),
                message: Some(c.commit.message),
                author_name: c.commit.author.as_ref().map(|a| a.name.clone()),
                authored_at: c.commit.author.map(|a| a.date),
                web_url: Some(c.html_url),
            })
            .collect();

        let files_url = format!("{}/repos/{owner}/{repo_name}/pulls/{n}/files?per_page=100", self.base_api);
        let files: Vec<GitHubPrFile> = self.get_json(&files_url).await?;

        let mut raw_text = String::new();
        for f in &files {
            if let Some(patch) = &f.patch {
                raw_text.push_str(&format!("diff --git a/{0} b/{0}\n--- a/{0}\n+++ b/{0}\n{1}\n", f.filename, patch));
            }
        }
        let document = parse_unified_diff(&raw_text)
            .map_err(|e| ScmError::new(ScmErrorKind::Malformed, PROVIDER, "get_diff", e.to_string()))?;

        Ok(DiffBundle { meta, commits, document, raw_text })
    }

    pub async fn is_change_request_open(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<bool> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}/pulls/{}", self.base_api, id.number());
        let resp: GitHubPr = self.get_json(&url).await?;
        Ok(resp.state == "open")
    }

    pub async fn get_repository(&self, repo: &RepositoryId) -> ScmResult<RepositorySummary> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}", self.base_api);
        let resp: GitHubRepo = self.get_json(&url).await?;
        Ok(RepositorySummary { id: resp.full_name.clone(), display_name: resp.full_name, web_url: resp.html_url })
    }

    pub async fn get_all_repositories(&self, owner: &str) -> ScmResult<Vec<RepositorySummary>> {
        let url = format!("{}/users/{owner}/repos?per_page=100", self.base_api);
        let repos: Vec<GitHubRepo> = self.get_json(&url).await?;
        Ok(repos.into_iter().map(|r| RepositorySummary { id: r.full_name.clone(), display_name: r.full_name, web_url: r.html_url }).collect())
    }

    /// Repositories the configured token can see, without requiring an
    /// owner/org up front (`GET /user/repos`).
    pub async fn get_accessible_repositories(&self) -> ScmResult<Vec<RepositorySummary>> {
        let url = format!("{}/user/repos?per_page=100&affiliation=owner,collaborator,organization_member", self.base_api);
        let repos: Vec<GitHubRepo> = self.get_json(&url).await?;
        Ok(repos.into_iter().map(|r| RepositorySummary { id: r.full_name.clone(), display_name: r.full_name, web_url: r.html_url }).collect())
    }

    pub async fn get_open_change_requests(&self, repo: &RepositoryId) -> ScmResult<Vec<ChangeRequestSummary>> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}/pulls?state=open&per_page=100", self.base_api);
        let prs: Vec<GitHubPr> = self.get_json(&url).await?;
        Ok(prs
            .into_iter()
            .map(|p| ChangeRequestSummary { number: p.number.unwrap_or(0), title: p.title, state: p.state, web_url: p.html_url })
            .collect())
    }

    pub async fn get_file_content(&self, repo: &RepositoryId, path: &str, git_ref: &str) -> ScmResult<Option<Vec<u8>>> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}/contents/{path}", self.base_api);
        let resp = self
            .http
            .get(&url)
            .query(&[("ref", git_ref)])
            .header("Authorization", &self.token)
            .header("Accept", "application/vnd.github.v3.raw")
            .send()
            .await
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_file_content"))?;

        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        let resp = resp.error_for_status().map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_file_content"))?;
        let bytes = resp.bytes().await.map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_file_content"))?;
        Ok(Some(bytes.to_vec()))
    }

    pub async fn get_commits_for(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<Vec<CrCommit>> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}/pulls/{}/commits", self.base_api, id.number());
        let raw: Vec<GitHubPrCommit> = self.get_json(&url).await?;
        Ok(raw
            .into_iter()
            .map(|c| CrCommit {
                id: c.sha,
                title: c.commit.message.lines().next().unwrap_or("").to_string(),
                message: Some(c.commit.message),
                author_name: c.commit.author.as_ref().map(|a| a.name.clone()),
                authored_at: c.commit.author.map(|a| a.date),
                web_url: Some(c.html_url),
            })
            .collect())
    }

    pub async fn get_commits_since(&self, repo: &RepositoryId, id: ChangeRequestId, since: DateTime<Utc>) -> ScmResult<Vec<CrCommit>> {
        let all = self.get_commits_for(repo, id).await?;
        Ok(all.into_iter().filter(|c| c.authored_at.is_none_or(|t| t >= since)).collect())
    }

    pub async fn publish_summary_comment(&self, repo: &RepositoryId, id: ChangeRequestId, body: &str) -> ScmResult<()> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let url = format!("{}/repos/{owner}/{repo_name}/issues/{}/comments", self.base_api, id.number());
        #[derive(Serialize)]
        struct Req<'a> {
            body: &'a str,
        }
        let resp = self
            .http
            .post(&url)
            .header("Authorization", &self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&Req { body })
            .send()
            .await
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "publish_summary_comment"))?;
        resp.error_for_status().map_err(|e| ScmError::from_reqwest(e, PROVIDER, "publish_summary_comment"))?;
        Ok(())
    }

    pub async fn publish_review(
        &self,
        repo: &RepositoryId,
        meta: &ChangeRequest,
        request_id: &str,
        drafts: &[InlineCommentDraft],
        fallback_body: Option<&str>,
    ) -> ScmResult<PublishOutcome> {
        let (owner, repo_name) = Self::owner_repo(repo)?;
        let mut outcome = PublishOutcome::default();

        let existing = self.load_existing_markers(owner, repo_name, meta.id).await.unwrap_or_default();

        let comments_url = format!("{}/repos/{owner}/{repo_name}/pulls/{}/comments", self.base_api, meta.id.number());

        for draft in drafts {
            let hash = format::hex_sha256(draft.body.as_bytes());
            let lookup = idempotency::draft_lookup_key(&draft.idempotency_key, &hash);
            if existing.contains(&lookup) {
                outcome.inline_skipped_duplicate += 1;
                continue;
            }

            let body = format::with_idempotency_marker(&draft.body, &draft.idempotency_key);
            let side = match draft.location.side {
                CommentSide::Right => "RIGHT",
                CommentSide::Left => "LEFT",
            };

            let payload = GitHubReviewCommentCreate {
                body: &body,
                commit_id: &meta.diff_refs.head_sha,
                path: &draft.location.file_path,
                line: draft.location.line,
                side,
            };

            let resp = self
                .http
                .post(&comments_url)
                .header("Authorization", &self.token)
                .header("Accept", "application/vnd.github+json")
                .json(&payload)
                .send()
                .await;

            match resp {
                Ok(r) if r.status().is_success() => outcome.inline_posted += 1,
                Ok(r) => {
                    let status = r.status();
                    warn!(%status, "github: inline comment post failed");
                    outcome.errors.push(format!("{}:{} -> http {}", draft.location.file_path, draft.location.line, status));
                }
                Err(e) => {
                    warn!(error = %e, "github: inline comment post failed");
                    outcome.errors.push(format!("{}:{} -> {}", draft.location.file_path, draft.location.line, e));
                }
            }
        }

        if let Some(fallback) = fallback_body {
            let marked = format::with_idempotency_marker(fallback, request_id);
            self.publish_summary_comment(repo, meta.id, &marked).await?;
            outcome.fallback_posted = true;
        }

        Ok(outcome)
    }

    async fn load_existing_markers(&self, owner: &str, repo_name: &str, id: ChangeRequestId) -> ScmResult<std::collections::HashSet<String>> {
        let url = format!("{}/repos/{owner}/{repo_name}/pulls/{}/comments?per_page=100", self.base_api, id.number());
        let comments: Vec<GitHubExistingComment> = self.get_json(&url).await?;
        Ok(idempotency::extract_existing_keys(comments.iter().map(|c| c.body.as_str())))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> ScmResult<T> {
        let resp = self
            .http
            .get(url)
            .header("Authorization", &self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))?
            .error_for_status()
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))?;
        resp.json::<T>().await.map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))
    }
}

#[derive(Debug, Deserialize)]
struct GitHubPr {
    number: Option<u64>,
    title: String,
    body: Option<String>,
    state: String,
    html_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user: GitHubUser,
    base: GitHubRef,
    head: GitHubRef,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    r#ref: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPrCommit {
    sha: String,
    html_url: String,
    commit: GitHubCommitInner,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitInner {
    message: String,
    author: Option<GitHubCommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitAuthor {
    name: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GitHubPrFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    full_name: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubExistingComment {
    body: String,
}

#[derive(Debug, Serialize)]
struct GitHubReviewCommentCreate<'a> {
    body: &'a str,
    commit_id: &'a str,
    path: &'a str,
    line: u32,
    side: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepositoryId {
        RepositoryId::GitHub { owner: "acme".into(), repo: "widgets".into() }
    }

    fn client(uri: String) -> GitHubClient {
        GitHubClient::new(Client::new(), uri, "tok".into())
    }

    #[tokio::test]
    async fn get_diff_assembles_bundle_from_three_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/pulls/7")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "number": 7, "title": "Add feature", "body": null, "state": "open",
            "html_url": "https://github.invalid/acme/widgets/pull/7",
            "created_at": "2026-01-01T00:00:00Z", "updated_at": "2026-01-01T00:00:00Z",
            "user": {"id": 1, "login": "alice"},
            "base": {"ref": "main", "sha": "base1"},
            "head": {"ref": "feature", "sha": "head1"},
            "labels": []
        }))).mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/pulls/7/commits")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).mount(&server).await;
        Mock::given(method("GET")).and(path("/repos/acme/widgets/pulls/7/files")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"filename": "src/lib.rs", "patch": "@@ -1 +1,2 @@\n-old\n+new\n+line"}
        ]))).mount(&server).await;

        let bundle = client(server.uri()).get_diff(&repo(), ChangeRequestId::Pr(7)).await.unwrap();
        assert_eq!(bundle.meta.title, "Add feature");
        assert_eq!(bundle.meta.diff_refs.head_sha, "head1");
        assert_eq!(bundle.document.modifications.len(), 1);
    }

    #[tokio::test]
    async fn publish_review_skips_drafts_already_marked() {
        let server = MockServer::start().await;
        let marked_body = format::with_idempotency_marker("existing note", "src/lib.rs:3");
        Mock::given(method("GET")).and(path("/repos/acme/widgets/pulls/7/comments")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"body": marked_body}
        ]))).mount(&server).await;

        let drafts = vec![InlineCommentDraft {
            location: CommentLocation { file_path: "src/lib.rs".into(), line: 3, side: CommentSide::Right },
            body: "existing note".into(),
            idempotency_key: "src/lib.rs:3".into(),
        }];

        let meta = ChangeRequest {
            provider: ProviderId::GitHub,
            repository: repo(),
            id: ChangeRequestId::Pr(7),
            title: "t".into(),
            description: None,
            author: AuthorInfo { id: "1".into(), username: None, name: None },
            state: "open".into(),
            web_url: "https://github.invalid".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            source_branch: None,
            target_branch: None,
            diff_refs: DiffRefs { base_sha: "base".into(), start_sha: None, head_sha: "head1".into() },
            labels: vec![],
        };

        let outcome = client(server.uri()).publish_review(&repo(), &meta, "req-1", &drafts, None).await.unwrap();
        assert_eq!(outcome.inline_posted, 0);
        assert_eq!(outcome.inline_skipped_duplicate, 1);
    }
}
