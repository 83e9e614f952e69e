//! Translation of repository web URLs (`https://github.com/<owner>/<name>`)
//! into REST, raw-content and lines-of-code service endpoints.
//!
//! Translation is a plain prefix substitution. Input that does not carry the
//! web-host prefix is used whole, so a malformed URL produces a malformed
//! endpoint and fails downstream with a non-2xx status instead of panicking.

use crate::config::Config;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// Parse `owner/name`, ignoring any trailing sub-resource segments.
    /// Missing parts come back empty rather than failing.
    pub fn parse(path: &str) -> Self {
        let mut parts = path.trim_matches('/').splitn(3, '/');
        let owner = parts.next().unwrap_or_default().to_string();
        let name = parts.next().unwrap_or_default().to_string();
        Self { owner, name }
    }

    pub fn from_web_url(web_url: &str, web_prefix: &str) -> Self {
        Self::parse(repo_path(web_url, web_prefix))
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The part of `web_url` after the last occurrence of `web_prefix`.
pub fn repo_path<'a>(web_url: &'a str, web_prefix: &str) -> &'a str {
    let tail = if web_prefix.is_empty() {
        web_url
    } else {
        web_url.rsplit(web_prefix).next().unwrap_or(web_url)
    };
    tail.trim_end_matches('/')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Repository,
    ClosedPulls,
    Contributors,
}

impl Resource {
    fn suffix(self) -> &'static str {
        match self {
            Resource::Repository => "",
            Resource::ClosedPulls => "/pulls?state=closed",
            Resource::Contributors => "/contributors",
        }
    }
}

pub fn api_endpoint(cfg: &Config, web_url: &str, resource: Resource) -> String {
    format!(
        "{}/repos/{}{}",
        cfg.api_url,
        repo_path(web_url, &cfg.web_url),
        resource.suffix()
    )
}

pub fn raw_content_url(cfg: &Config, web_url: &str, branch: &str, file: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        cfg.raw_url,
        repo_path(web_url, &cfg.web_url),
        branch,
        file.trim_start_matches('/')
    )
}

/// Lines-of-code service URL for the repository. No request is made.
pub fn code_tab_url(cfg: &Config, web_url: &str) -> String {
    format!("{}{}", cfg.code_tab_url, repo_path(web_url, &cfg.web_url))
}
