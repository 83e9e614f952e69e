use crate::client::MetricsClient;
use crate::error::MetricsError;
use crate::http;
use log::debug;
use serde::Deserialize;

/// Ref counted by [`MetricsClient::count_commits`].
// Repositories whose default branch is not `master` report 0 here.
pub const DEFAULT_COMMIT_REF: &str = "master";

pub const MERGED_PR_PAGE_SIZE: u32 = 100;

const COMMIT_COUNT_QUERY: &str = r#"
query CommitCount($owner: String!, $name: String!, $qualifiedName: String!) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $qualifiedName) {
      target {
        ... on Commit {
          history {
            totalCount
          }
        }
      }
    }
  }
}
"#;

const MERGED_PRS_QUERY: &str = r#"
query MergedPullRequests($repositoryOwner: String!, $repositoryName: String!, $first: Int!, $pullRequestCursor: String) {
  repository(owner: $repositoryOwner, name: $repositoryName) {
    pullRequests(states: MERGED, first: $first, after: $pullRequestCursor) {
      pageInfo { endCursor hasNextPage }
      edges { node { number } }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct CommitData {
    repository: Option<CommitRepository>,
}

#[derive(Debug, Deserialize)]
struct CommitRepository {
    #[serde(rename = "ref")]
    git_ref: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    target: Option<CommitTarget>,
}

#[derive(Debug, Deserialize)]
struct CommitTarget {
    // Absent when the ref points at something other than a commit.
    history: Option<CommitHistorySummary>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitHistorySummary {
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
struct PullRequestData {
    repository: Option<PullRequestRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRepository {
    pull_requests: PullRequestPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestPage {
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<PullRequestEdge>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEdge {
    pub node: PullRequestRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
}

impl MetricsClient {
    /// Total commits reachable from `master`.
    ///
    /// A missing ref counts as 0 rather than an error.
    pub async fn count_commits(&self, owner: &str, repo: &str, token: &str) -> Result<u64, MetricsError> {
        self.count_commits_on_ref(owner, repo, DEFAULT_COMMIT_REF, token)
            .await
    }

    pub async fn count_commits_on_ref(
        &self,
        owner: &str,
        repo: &str,
        qualified_ref: &str,
        token: &str,
    ) -> Result<u64, MetricsError> {
        let vars = serde_json::json!({
            "owner": owner,
            "name": repo,
            "qualifiedName": qualified_ref,
        });
        let data: CommitData = http::graphql_post(
            &self.http,
            &self.cfg,
            token,
            "commit count",
            COMMIT_COUNT_QUERY,
            &vars,
        )
        .await?;
        let total = data
            .repository
            .and_then(|r| r.git_ref)
            .and_then(|r| r.target)
            .and_then(|t| t.history)
            .map(|h| h.total_count)
            .unwrap_or(0);
        debug!("{}/{}@{}: {} commits", owner, repo, qualified_ref, total);
        Ok(total)
    }

    /// Number of merged pull requests, walking every page of the connection.
    ///
    /// Any failing page aborts the walk; partial totals are discarded.
    pub async fn count_merged_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<u64, MetricsError> {
        let mut cursor: Option<String> = None;
        let mut total: u64 = 0;
        let mut pages: u32 = 0;
        loop {
            let vars = serde_json::json!({
                "repositoryOwner": owner,
                "repositoryName": repo,
                "first": MERGED_PR_PAGE_SIZE,
                "pullRequestCursor": cursor,
            });
            let data: PullRequestData = http::graphql_post(
                &self.http,
                &self.cfg,
                token,
                "merged pull requests",
                MERGED_PRS_QUERY,
                &vars,
            )
            .await?;
            let page = data
                .repository
                .ok_or_else(|| MetricsError::NotFound(format!("{}/{}", owner, repo)))?
                .pull_requests;

            pages += 1;
            total += page.edges.len() as u64;
            debug!(
                "{}/{}: merged PR page {} had {} entries (running total {})",
                owner,
                repo,
                pages,
                page.edges.len(),
                total
            );

            if !page.page_info.has_next_page {
                break;
            }
            match page.page_info.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    return Err(MetricsError::GraphQl(
                        "hasNextPage was true but endCursor was null".into(),
                    ))
                }
            }
        }
        Ok(total)
    }
}
