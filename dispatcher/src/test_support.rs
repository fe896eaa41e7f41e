//! Fixtures shared by this crate's unit tests only.

use chrono::Utc;
use diff_model::DiffDocument;
use scm::{AuthorInfo, ChangeRequest, ChangeRequestId, DiffBundle, DiffRefs, ProviderId, RepositoryId};

pub fn empty_diff_bundle() -> DiffBundle {
    let now = Utc::now();
    DiffBundle {
        meta: ChangeRequest {
            provider: ProviderId::GitHub,
            repository: RepositoryId::GitHub { owner: "o".into(), repo: "r".into() },
            id: ChangeRequestId::Pr(1),
            title: "t".into(),
            description: None,
            author: AuthorInfo { id: "1".into(), username: None, name: None },
            state: "open".into(),
            web_url: "https://example.invalid/o/r/pull/1".into(),
            created_at: now,
            updated_at: now,
            source_branch: None,
            target_branch: None,
            diff_refs: DiffRefs { base_sha: "base".into(), start_sha: None, head_sha: "head".into() },
            labels: vec![],
        },
        commits: vec![],
        document: DiffDocument::default(),
        raw_text: String::new(),
    }
}
