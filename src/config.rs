use crate::error::MetricsError;
use std::env;
use url::Url;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
const DEFAULT_WEB_URL: &str = "https://github.com/";
const DEFAULT_CODE_TAB_URL: &str = "https://api.codetabs.com/v1/loc?github=";
const DEFAULT_API_VERSION: &str = "2022-11-28";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the metrics client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub graphql_url: String,
    pub raw_url: String,
    /// Web-host prefix stripped from repository URLs, trailing slash included.
    pub web_url: String,
    pub code_tab_url: String,
    pub api_version: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Defaults for public GitHub with an explicit token. Does not read the environment.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: format!("{}/graphql", DEFAULT_API_URL),
            raw_url: DEFAULT_RAW_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            code_tab_url: DEFAULT_CODE_TAB_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - GITHUB_TOKEN (or GH_TOKEN) [required]
    /// - GITHUB_API_URL (default: https://api.github.com)
    /// - GITHUB_GRAPHQL_URL (default: <GITHUB_API_URL>/graphql)
    /// - GITHUB_RAW_URL (default: https://raw.githubusercontent.com)
    /// - GITHUB_WEB_URL (default: https://github.com/)
    /// - CODETABS_URL (default: https://api.codetabs.com/v1/loc?github=)
    /// - GITHUB_API_VERSION (default: 2022-11-28)
    /// - GITHUB_HTTP_TIMEOUT_SECS (default: 30)
    /// - GITHUB_USER_AGENT (default: repo-metrics/<version>)
    pub fn from_env() -> Result<Self, MetricsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MetricsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("GITHUB_TOKEN")
            .or_else(|| get("GH_TOKEN"))
            .ok_or_else(|| MetricsError::Config("Missing GITHUB_TOKEN or GH_TOKEN".into()))?;

        let api_url = get("GITHUB_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let graphql_url = get("GITHUB_GRAPHQL_URL").unwrap_or_else(|| format!("{}/graphql", api_url));
        let raw_url = get("GITHUB_RAW_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_RAW_URL.to_string());
        let web_url = get("GITHUB_WEB_URL")
            .map(|s| format!("{}/", s.trim_end_matches('/')))
            .unwrap_or_else(|| DEFAULT_WEB_URL.to_string());
        let code_tab_url = get("CODETABS_URL").unwrap_or_else(|| DEFAULT_CODE_TAB_URL.to_string());
        let api_version = get("GITHUB_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let timeout_secs = match get("GITHUB_HTTP_TIMEOUT_SECS") {
            Some(s) => s.trim().parse::<u64>().map_err(|_| {
                MetricsError::Config(format!("GITHUB_HTTP_TIMEOUT_SECS is not a number: {}", s))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let user_agent = get("GITHUB_USER_AGENT").unwrap_or_else(default_user_agent);

        for (name, value) in [
            ("GITHUB_API_URL", &api_url),
            ("GITHUB_GRAPHQL_URL", &graphql_url),
            ("GITHUB_RAW_URL", &raw_url),
            ("GITHUB_WEB_URL", &web_url),
            ("CODETABS_URL", &code_tab_url),
        ] {
            validate_url(name, value)?;
        }

        Ok(Self {
            token,
            api_url,
            graphql_url,
            raw_url,
            web_url,
            code_tab_url,
            api_version,
            user_agent,
            timeout_secs,
        })
    }
}

fn default_user_agent() -> String {
    format!("repo-metrics/{}", env!("CARGO_PKG_VERSION"))
}

fn validate_url(name: &str, value: &str) -> Result<(), MetricsError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| MetricsError::Config(format!("{} is not a valid URL ({}): {}", name, e, value)))
}
