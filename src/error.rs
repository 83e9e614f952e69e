use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by every fetch operation in this crate.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("failed to decode {what} response body: {body}")]
    Decode {
        what: &'static str,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("repository not found: {0}")]
    NotFound(String),
}

impl MetricsError {
    /// Stable short label, suitable for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            MetricsError::Config(_) => "config_error",
            MetricsError::Transport { .. } => "upstream_error",
            MetricsError::Status { status, .. } => map_status_to_code(*status).0,
            MetricsError::Decode { .. } => "decode_error",
            MetricsError::GraphQl(_) => "graphql_error",
            MetricsError::NotFound(_) => "not_found",
        }
    }

    /// Whether repeating the same call later could plausibly succeed.
    pub fn retriable(&self) -> bool {
        match self {
            MetricsError::Transport { .. } => true,
            MetricsError::Status { status, .. } => map_status_to_code(*status).1,
            _ => false,
        }
    }
}

pub fn map_status_to_code(status: StatusCode) -> (&'static str, bool) {
    match status {
        StatusCode::BAD_REQUEST => ("bad_request", false),
        StatusCode::UNAUTHORIZED => ("unauthorized", false),
        StatusCode::FORBIDDEN => ("forbidden", false),
        StatusCode::NOT_FOUND => ("not_found", false),
        StatusCode::CONFLICT => ("conflict", false),
        StatusCode::TOO_MANY_REQUESTS => ("rate_limited", true),
        s if s.is_server_error() => ("upstream_error", true),
        _ => ("server_error", false),
    }
}
