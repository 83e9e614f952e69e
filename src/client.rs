use crate::config::Config;
use crate::error::MetricsError;
use crate::http;
use crate::urls::RepositoryRef;
use reqwest::Client;

/// Entry point for every fetch in this crate.
///
/// Holds one pooled HTTP client and one [`Config`]; cloning is cheap and
/// clones share the connection pool. Calls do not share any mutable state.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    pub(crate) http: Client,
    pub(crate) cfg: Config,
}

impl MetricsClient {
    pub fn new(cfg: Config) -> Result<Self, MetricsError> {
        let http = http::build_client(&cfg)?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self, MetricsError> {
        Self::new(Config::from_env()?)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The configured default access token.
    pub fn token(&self) -> &str {
        &self.cfg.token
    }

    pub fn repository_ref(&self, web_url: &str) -> RepositoryRef {
        RepositoryRef::from_web_url(web_url, &self.cfg.web_url)
    }
}
