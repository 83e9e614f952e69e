use crate::client::MetricsClient;
use crate::error::MetricsError;
use crate::http;
use crate::types::{Contributor, PullRequestDetail, PullRequestSummary, RepositoryInfo};
use crate::urls::{self, Resource};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DefaultBranchOnly {
    default_branch: String,
}

/// Strip surrounding whitespace, quotes and colons from a branch name.
pub fn trim_branch_name(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches(':')
        .trim_matches('"')
        .to_string()
}

impl MetricsClient {
    pub async fn get_repository(&self, web_url: &str) -> Result<RepositoryInfo, MetricsError> {
        let url = urls::api_endpoint(&self.cfg, web_url, Resource::Repository);
        http::rest_get_json(&self.http, &self.cfg, &url, "repository").await
    }

    /// Name of the repository's default branch.
    pub async fn default_branch_name(&self, web_url: &str) -> Result<String, MetricsError> {
        let url = urls::api_endpoint(&self.cfg, web_url, Resource::Repository);
        let repo: DefaultBranchOnly =
            http::rest_get_json(&self.http, &self.cfg, &url, "repository").await?;
        Ok(trim_branch_name(&repo.default_branch))
    }

    /// First page of closed pull requests (merged or not), as the REST API orders them.
    pub async fn list_closed_pull_requests(
        &self,
        web_url: &str,
    ) -> Result<Vec<PullRequestSummary>, MetricsError> {
        let url = urls::api_endpoint(&self.cfg, web_url, Resource::ClosedPulls);
        http::rest_get_json(&self.http, &self.cfg, &url, "pull request list").await
    }

    /// Fetch a single pull request by its API URL, e.g. the `url` of a list entry.
    pub async fn get_pull_request(&self, api_url: &str) -> Result<PullRequestDetail, MetricsError> {
        http::rest_get_json(&self.http, &self.cfg, api_url, "pull request").await
    }

    pub async fn list_contributors(&self, web_url: &str) -> Result<Vec<Contributor>, MetricsError> {
        let url = urls::api_endpoint(&self.cfg, web_url, Resource::Contributors);
        let resp = http::rest_get(&self.http, &self.cfg, &url, http::GITHUB_JSON)
            .await?
            .error_for_status()?;
        // Empty repositories answer 204 with no body.
        if resp.status == StatusCode::NO_CONTENT || resp.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        resp.decode("contributor list")
    }
}
