//! GitLab provider (REST v4) adapter.
//!
//! Endpoints used:
//!   * GET /projects/:id
//!   * GET /projects/:id/merge_requests/:iid
//!   * GET /projects/:id/merge_requests/:iid/commits
//!   * GET /projects/:id/merge_requests/:iid/diffs
//!   * GET /projects/:id/repository/files/:path/raw?ref=:ref
//!   * GET /projects/:id/merge_requests?state=opened
//!   * POST /projects/:id/merge_requests/:iid/discussions  (inline)
//!   * POST /projects/:id/merge_requests/:iid/notes        (summary)
//!   * GET  /projects/:id/merge_requests/:iid/discussions  (idempotency)

use chrono::{DateTime, Utc};
use diff_model::parse_unified_diff;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ScmError, ScmErrorKind, ScmResult};
use crate::format;
use crate::idempotency;
use crate::types::*;

const PROVIDER: &str = "gitlab";

#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String,
    token: String,
}

impl GitLabClient {
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        Self { http, base_api, token }
    }

    fn project_id(repo: &RepositoryId) -> ScmResult<&str> {
        match repo {
            RepositoryId::GitLab { project_id } => Ok(project_id.as_str()),
            RepositoryId::GitHub { .. } => {
                Err(ScmError::new(ScmErrorKind::Malformed, PROVIDER, "project_id", "expected a GitLab repository id"))
            }
        }
    }

    pub async fn get_diff(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<DiffBundle> {
        let project = Self::project_id(repo)?;
        let n = id.number();
        let encoded = urlencoding::encode(project);

        let url = format!("{}/projects/{encoded}/merge_requests/{n}", self.base_api);
        debug!(url, "gitlab get_diff: fetching metadata");
        let resp: GitLabMr = self.get_json(&url).await?;

        let diff_refs = DiffRefs {
            base_sha: resp.diff_refs.base_sha,
            start_sha: Some(resp.diff_refs.start_sha),
            head_sha: resp.diff_refs.head_sha,
        };
        let author = AuthorInfo { id: resp.author.id.to_string(), username: Some(resp.author.username.clone()), name: Some(resp.author.name) };

        let meta = ChangeRequest {
            provider: ProviderId::GitLab,
            repository: repo.clone(),
            id,
            title: resp.title,
            description: resp.description,
            author,
            state: resp.state,
            web_url: resp.web_url,
            created_at: resp.created_at,
            updated_at: resp.updated_at,
            source_branch: Some(resp.source_branch),
            target_branch: Some(resp.target_branch),
            diff_refs,
            labels: resp.labels,
        };

        let commits_url = format!("{}/projects/{encoded}/merge_requests/{n}/commits", self.base_api);
        let raw_commits: Vec<GitLabMrCommit> = self.get_json(&commits_url).await?;
        let commits = raw_commits
            .into_iter()
            .map(|c| CrCommit { id: c.id, title: c.title, message: Some(c.message), author_name: Some(c.author_name), authored_at: c.created_at, web_url: c.web_url })
            .collect();

        let diffs_url = format!("{}/projects/{encoded}/merge_requests/{n}/diffs?per_page=100", self.base_api);
        let files: Vec<GitLabMrDiffFile> = self.get_json(&diffs_url).await?;

        let mut raw_text = String::new();
        for f in &files {
            if let Some(d) = &f.diff {
                raw_text.push_str(&format!("diff --git a/{0} b/{1}\n--- a/{0}\n+++ b/{1}\n{2}\n", f.old_path, f.new_path, d));
            }
        }
        let document = parse_unified_diff(&raw_text)
            .map_err(|e| ScmError::new(ScmErrorKind::Malformed, PROVIDER, "get_diff", e.to_string()))?;

        Ok(DiffBundle { meta, commits, document, raw_text })
    }

    pub async fn is_change_request_open(&self, repo: &RepositoryId, id: ChangeRequestId) -> ScmResult<bool> {
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}/merge_requests/{}", self.base_api, urlencoding::encode(project), id.number());
        let resp: GitLabMr = self.get_json(&url).await?;
        Ok(resp.state == "opened")
    }

    pub async fn get_repository(&self, repo: &RepositoryId) -> ScmResult<RepositorySummary> {
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}", self.base_api, urlencoding::encode(project));
        let resp: GitLabProject = self.get_json(&url).await?;
        Ok(RepositorySummary { id: resp.id.to_string(), display_name: resp.path_with_namespace, web_url: resp.web_url })
    }

    pub async fn get_all_repositories(&self) -> ScmResult<Vec<RepositorySummary>> {
        let url = format!("{}/projects?membership=true&per_page=100", self.base_api);
        let projects: Vec<GitLabProject> = self.get_json(&url).await?;
        Ok(projects.into_iter().map(|p| RepositorySummary { id: p.id.to_string(), display_name: p.path_with_namespace, web_url: p.web_url }).collect())
    }

    pub async fn get_open_change_requests(&self, repo: &RepositoryId) -> ScmResult<Vec<ChangeRequestSummary>> {
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}/merge_requests?state=opened&per_page=100", self.base_api, urlencoding::encode(project));
        let mrs: Vec<GitLabMr> = self.get_json(&url).await?;
        Ok(mrs.into_iter().map(|m| ChangeRequestSummary { number: m.iid, title: m.title, state: m.state, web_url: m.web_url }).collect())
    }

    pub async fn get_file_content(&self, repo: &RepositoryId, path: &str, git_ref: &str) -> ScmResult<Option<Vec<u8>>> {
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}/repository/files/{}/raw", self.base_api, urlencoding::encode(project), urlencoding::encode(path));
        let resp = self
            .http
            .get(&url)
            .query(&[("ref", git_ref)])
            .header("PRIVATE-TOKEN", &self.token)
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
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}/merge_requests/{}/commits", self.base_api, urlencoding::encode(project), id.number());
        let raw: Vec<GitLabMrCommit> = self.get_json(&url).await?;
        Ok(raw
            .into_iter()
            .map(|c| CrCommit { id: c.id, title: c.title, message: Some(c.message), author_name: Some(c.author_name), authored_at: c.created_at, web_url: c.web_url })
            .collect())
    }

    pub async fn get_commits_since(&self, repo: &RepositoryId, id: ChangeRequestId, since: DateTime<Utc>) -> ScmResult<Vec<CrCommit>> {
        let all = self.get_commits_for(repo, id).await?;
        Ok(all.into_iter().filter(|c| c.authored_at.is_none_or(|t| t >= since)).collect())
    }

    pub async fn publish_summary_comment(&self, repo: &RepositoryId, id: ChangeRequestId, body: &str) -> ScmResult<()> {
        let project = Self::project_id(repo)?;
        let url = format!("{}/projects/{}/merge_requests/{}/notes", self.base_api, urlencoding::encode(project), id.number());
        #[derive(Serialize)]
        struct Req<'a> {
            body: &'a str,
        }
        let resp = self
            .http
            .post(&url)
            .header("PRIVATE-TOKEN", &self.token)
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
        let project = Self::project_id(repo)?;
        let encoded = urlencoding::encode(project);
        let mut outcome = PublishOutcome::default();

        let existing = self.load_existing_markers(&encoded, meta.id).await.unwrap_or_default();

        let url = format!("{}/projects/{encoded}/merge_requests/{}/discussions", self.base_api, meta.id.number());
        let start_sha = meta.diff_refs.start_sha.clone().unwrap_or_else(|| meta.diff_refs.base_sha.clone());

        for draft in drafts {
            let hash = format::hex_sha256(draft.body.as_bytes());
            let lookup = idempotency::draft_lookup_key(&draft.idempotency_key, &hash);
            if existing.contains(&lookup) {
                outcome.inline_skipped_duplicate += 1;
                continue;
            }

            let body = format::with_idempotency_marker(&draft.body, &draft.idempotency_key);
            let position = GitLabPosition {
                base_sha: &meta.diff_refs.base_sha,
                start_sha: &start_sha,
                head_sha: &meta.diff_refs.head_sha,
                position_type: "text",
                new_path: Some(&draft.location.file_path),
                new_line: Some(draft.location.line),
            };

            let resp = self
                .http
                .post(&url)
                .header("PRIVATE-TOKEN", &self.token)
                .json(&GitLabDiscussionCreate { body: &body, position })
                .send()
                .await;

            match resp {
                Ok(r) if r.status().is_success() => outcome.inline_posted += 1,
                Ok(r) => {
                    let status = r.status();
                    warn!(%status, "gitlab: discussion post failed");
                    outcome.errors.push(format!("{}:{} -> http {}", draft.location.file_path, draft.location.line, status));
                }
                Err(e) => {
                    warn!(error = %e, "gitlab: discussion post failed");
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

    async fn load_existing_markers(&self, encoded_project: &str, id: ChangeRequestId) -> ScmResult<std::collections::HashSet<String>> {
        let url = format!("{}/projects/{encoded_project}/merge_requests/{}/discussions?per_page=100", self.base_api, id.number());
        let discussions: Vec<GitLabDiscussion> = self.get_json(&url).await?;
        let bodies = discussions.iter().flat_map(|d| d.notes.iter()).filter_map(|n| n.body.as_deref());
        Ok(idempotency::extract_existing_keys(bodies))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> ScmResult<T> {
        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))?
            .error_for_status()
            .map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))?;
        resp.json::<T>().await.map_err(|e| ScmError::from_reqwest(e, PROVIDER, "get_json"))
    }
}

#[derive(Debug, Deserialize)]
struct GitLabMr {
    iid: u64,
    title: String,
    description: Option<String>,
    web_url: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    labels: Vec<String>,
    diff_refs: GitLabDiffRefs,
    author: GitLabUser,
}

#[derive(Debug, Deserialize)]
struct GitLabDiffRefs {
    base_sha: String,
    head_sha: String,
    start_sha: String,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: u64,
    username: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitLabMrCommit {
    id: String,
    title: String,
    message: String,
    author_name: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabMrDiffFile {
    old_path: String,
    new_path: String,
    #[serde(default)]
    diff: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabProject {
    id: u64,
    path_with_namespace: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct GitLabDiscussionNote {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabDiscussion {
    notes: Vec<GitLabDiscussionNote>,
}

#[derive(Debug, Serialize)]
struct GitLabPosition<'a> {
    base_sha: &'a str,
    start_sha: &'a str,
    head_sha: &'a str,
    position_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_line: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GitLabDiscussionCreate<'a> {
    body: &'a str,
    position: GitLabPosition<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepositoryId {
        RepositoryId::GitLab { project_id: "42".into() }
    }

    fn client(uri: String) -> GitLabClient {
        GitLabClient::new(Client::new(), uri, "tok".into())
    }

    fn meta() -> ChangeRequest {
        ChangeRequest {
            provider: ProviderId::GitLab,
            repository: repo(),
            id: ChangeRequestId::Mr(9),
            title: "t".into(),
            description: None,
            author: AuthorInfo { id: "1".into(), username: None, name: None },
            state: "opened".into(),
            web_url: "https://gitlab.invalid".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            source_branch: None,
            target_branch: None,
            diff_refs: DiffRefs { base_sha: "base".into(), start_sha: Some("start".into()), head_sha: "head".into() },
            labels: vec![],
        }
    }

    #[tokio::test]
    async fn get_open_change_requests_maps_mrs() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/projects/42/merge_requests")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"iid": 9, "title": "Fix bug", "state": "opened", "web_url": "https://gitlab.invalid/42/-/merge_requests/9"}
        ]))).mount(&server).await;

        let summaries = client(server.uri()).get_open_change_requests(&repo()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].number, 9);
    }

    #[tokio::test]
    async fn publish_review_marks_new_drafts_with_their_own_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/projects/42/merge_requests/9/discussions")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).mount(&server).await;
        Mock::given(method("POST")).and(path("/projects/42/merge_requests/9/discussions")).respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({}))).mount(&server).await;

        let drafts = vec![InlineCommentDraft {
            location: CommentLocation { file_path: "a.rs".into(), line: 5, side: CommentSide::Right },
            body: "looks off".into(),
            idempotency_key: "a.rs:5".into(),
        }];

        let outcome = client(server.uri()).publish_review(&repo(), &meta(), "req-1", &drafts, None).await.unwrap();
        assert_eq!(outcome.inline_posted, 1);
        assert_eq!(outcome.inline_skipped_duplicate, 0);
    }

    #[tokio::test]
    async fn publish_review_skips_a_draft_already_marked_by_its_own_key() {
        let server = MockServer::start().await;
        let marked = format::with_idempotency_marker("looks off", "a.rs:5");
        Mock::given(method("GET")).and(path("/projects/42/merge_requests/9/discussions")).respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"notes": [{"body": marked}]}
        ]))).mount(&server).await;

        let drafts = vec![InlineCommentDraft {
            location: CommentLocation { file_path: "a.rs".into(), line: 5, side: CommentSide::Right },
            body: "looks off".into(),
            idempotency_key: "a.rs:5".into(),
        }];

        let outcome = client(server.uri()).publish_review(&repo(), &meta(), "req-1", &drafts, None).await.unwrap();
        assert_eq!(outcome.inline_posted, 0);
        assert_eq!(outcome.inline_skipped_duplicate, 1);
    }
}
