use crate::config::Config;
use crate::error::MetricsError;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GITHUB_JSON: &str = "application/vnd.github+json";
pub const ANY_CONTENT: &str = "*/*";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateMeta {
    pub remaining: Option<i32>,
    pub used: Option<i32>,
    pub reset_at: Option<String>,
}

/// A fully read REST response. The connection is released before this is returned.
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
    pub rate: RateMeta,
}

impl RestResponse {
    pub fn error_for_status(self) -> Result<Self, MetricsError> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(MetricsError::Status {
            url: self.url,
            status: self.status,
            message: self.body,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, MetricsError> {
        serde_json::from_str(&self.body).map_err(|source| MetricsError::Decode {
            what,
            body: self.body.clone(),
            source,
        })
    }
}

pub fn build_client(cfg: &Config) -> Result<Client, MetricsError> {
    let mut default_headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|_| MetricsError::Config(format!("invalid user agent: {}", cfg.user_agent)))?;
    default_headers.insert(USER_AGENT, user_agent);
    // Authorization header is injected per request; the GraphQL counters take their own token.
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(|e| MetricsError::Config(format!("failed to build HTTP client: {}", e)))
}

fn auth_header(token: &str) -> Result<HeaderValue, MetricsError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| MetricsError::Config("access token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

pub fn extract_rate_from_rest(headers: &HeaderMap) -> RateMeta {
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i32>().ok());
    let used = headers
        .get("x-ratelimit-used")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i32>().ok());
    let reset_at = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|epoch| chrono::DateTime::<chrono::Utc>::from_timestamp(epoch, 0))
        .map(|ts| ts.to_rfc3339());
    RateMeta {
        remaining,
        used,
        reset_at,
    }
}

/// Authenticated GET. Any status is returned as-is; only transport failures are errors.
pub async fn rest_get(
    client: &Client,
    cfg: &Config,
    url: &str,
    accept: &'static str,
) -> Result<RestResponse, MetricsError> {
    debug!("GET {}", url);
    let transport = |source| MetricsError::Transport {
        url: url.to_string(),
        source,
    };
    let res = client
        .get(url)
        .header(AUTHORIZATION, auth_header(&cfg.token)?)
        .header("X-GitHub-Api-Version", &cfg.api_version)
        .header(ACCEPT, HeaderValue::from_static(accept))
        .send()
        .await
        .map_err(transport)?;

    let status = res.status();
    let rate = extract_rate_from_rest(res.headers());
    if rate.remaining.is_some() {
        debug!(
            "GET {} -> {} (rate remaining={:?} used={:?} reset_at={:?})",
            url, status, rate.remaining, rate.used, rate.reset_at
        );
    } else {
        debug!("GET {} -> {}", url, status);
    }
    let body = res.text().await.map_err(transport)?;
    Ok(RestResponse {
        url: url.to_string(),
        status,
        body,
        rate,
    })
}

pub async fn rest_get_json<T: DeserializeOwned>(
    client: &Client,
    cfg: &Config,
    url: &str,
    what: &'static str,
) -> Result<T, MetricsError> {
    rest_get(client, cfg, url, GITHUB_JSON)
        .await?
        .error_for_status()?
        .decode(what)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>, // standard GraphQL errors
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// POST one GraphQL query. A non-empty `errors` array fails the whole call, even
/// when partial `data` came back.
pub async fn graphql_post<T: DeserializeOwned>(
    client: &Client,
    cfg: &Config,
    token: &str,
    what: &'static str,
    query: &str,
    variables: &serde_json::Value,
) -> Result<T, MetricsError> {
    let transport = |source| MetricsError::Transport {
        url: cfg.graphql_url.clone(),
        source,
    };
    let body = serde_json::json!({ "query": query, "variables": variables });
    debug!("POST {} ({})", cfg.graphql_url, what);
    let res = client
        .post(&cfg.graphql_url)
        .header(AUTHORIZATION, auth_header(token)?)
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .json(&body)
        .send()
        .await
        .map_err(transport)?;

    let status = res.status();
    let text = res.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(MetricsError::Status {
            url: cfg.graphql_url.clone(),
            status,
            message: text,
        });
    }

    let parsed = match serde_json::from_str::<GraphQlResponse<T>>(&text) {
        Ok(p) => p,
        Err(source) => {
            return Err(MetricsError::Decode {
                what,
                body: text,
                source,
            })
        }
    };
    if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
        let msg = errors
            .iter()
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(MetricsError::GraphQl(msg));
    }
    parsed
        .data
        .ok_or_else(|| MetricsError::GraphQl(format!("{} response carried no data", what)))
}
